//! SPI/DSPI/QSPI flash read engine
//!
//! Given an address and a size, clocks out the read command, the address and
//! the mode/dummy cycles, then streams bytes back with a one-cycle `valid`
//! strobe per byte. The SPI clock is the inverted system clock gated by
//! chip-select, so every `sync` cycle with CS asserted is one SPI clock.
//!
//! Per-width bit timing:
//!
//! | width | opcode | address cycles     | wait cycles       | cycles/byte |
//! |-------|--------|--------------------|-------------------|-------------|
//! | 1     | 0x0B   | 24                 | 8 dummy           | 8           |
//! | 2     | 0xBB   | 12                 | 4 mode            | 4           |
//! | 4     | 0xEB   | 6 (+2 mode, zeros) | 4 dummy           | 2           |
//!
//! A request is only latched from `Idle`; triggers during a transaction are
//! ignored. There are no retries.

use super::device::{SpiDevice, SpiPins, DUAL_IO_READ, QUAD_IO_READ, READ_ARRAY};
use crate::error::BuildError;
use crate::signals::{FlashBus, FlashReply};

/// Bus width of the flash interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderWidth {
    Single,
    Dual,
    Quad,
}

impl ReaderWidth {
    /// Number of data lines
    pub fn bits(self) -> u8 {
        match self {
            ReaderWidth::Single => 1,
            ReaderWidth::Dual => 2,
            ReaderWidth::Quad => 4,
        }
    }

    /// Read opcode issued for this width
    pub fn opcode(self) -> u8 {
        match self {
            ReaderWidth::Single => READ_ARRAY,
            ReaderWidth::Dual => DUAL_IO_READ,
            ReaderWidth::Quad => QUAD_IO_READ,
        }
    }

    /// Clock cycles from trigger until the reader is idle again after
    /// streaming `size` bytes.
    pub fn transaction_cycles(self, size: u16) -> u32 {
        let w = u32::from(self.bits());
        let (addr, wait) = match self {
            ReaderWidth::Single => (24, 8),
            ReaderWidth::Dual => (12, 4),
            ReaderWidth::Quad => (8, 4),
        };
        // idle cycle + command + address + wait + data + final cycle
        1 + 8 + addr + wait + u32::from(size) * (8 / w) + 1
    }
}

impl TryFrom<u8> for ReaderWidth {
    type Error = BuildError;

    fn try_from(width: u8) -> Result<Self, Self::Error> {
        match width {
            1 => Ok(ReaderWidth::Single),
            2 => Ok(ReaderWidth::Dual),
            4 => Ok(ReaderWidth::Quad),
            other => Err(BuildError::InvalidReaderWidth(other)),
        }
    }
}

/// Reader state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Idle,
    WriteCmd,
    WriteAddr,
    DataWait,
    DataRead,
}

/// The flash read engine, owning the device it talks to
#[derive(Debug)]
pub struct FlashReader<D> {
    width: ReaderWidth,
    device: D,
    state: ReaderState,
    cs: bool,
    ctr: u8,
    addr: u32,
    size: u16,
    shiftreg: u32,
    valid: bool,
}

impl<D: SpiDevice> FlashReader<D> {
    pub fn new(width: ReaderWidth, device: D) -> Self {
        Self {
            width,
            device,
            state: ReaderState::Idle,
            cs: false,
            ctr: 0,
            addr: 0,
            size: 0,
            shiftreg: 0,
            valid: false,
        }
    }

    pub fn width(&self) -> ReaderWidth {
        self.width
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == ReaderState::Idle
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Registered outputs
    pub fn outputs(&self) -> FlashReply {
        FlashReply {
            data: self.shiftreg as u8,
            valid: self.valid,
        }
    }

    /// Pin levels for the current cycle
    fn pins(&self) -> SpiPins {
        let w = self.width.bits();
        let mask = (1u8 << w) - 1;
        let (dq_out, dq_oe) = match self.state {
            ReaderState::WriteCmd => (((self.shiftreg >> 7) & 1) as u8, 1),
            ReaderState::WriteAddr => (((self.shiftreg >> (24 - w)) as u8) & mask, mask),
            _ => (0, 0),
        };
        SpiPins {
            cs: self.cs,
            dq_out,
            dq_oe,
        }
    }

    /// Advance one clock with the request bus as seen this cycle
    pub fn step(&mut self, bus: FlashBus) {
        let w = self.width.bits();
        let dq_in = self.device.clock(self.pins());

        match self.state {
            ReaderState::Idle => {
                if bus.read_trigger {
                    tracing::trace!(
                        "flash read {:#08x} x{} ({}-bit)",
                        bus.addr,
                        bus.read_size,
                        w
                    );
                    self.cs = true;
                    self.ctr = 7;
                    self.addr = bus.addr & 0xFF_FFFF;
                    self.size = bus.read_size;
                    self.shiftreg = u32::from(self.width.opcode());
                    self.state = ReaderState::WriteCmd;
                } else {
                    self.cs = false;
                }
            }
            ReaderState::WriteCmd => {
                if self.ctr == 0 {
                    self.ctr = if w == 4 { 28 } else { 24 - w };
                    self.shiftreg = self.addr;
                    self.state = ReaderState::WriteAddr;
                } else {
                    self.shiftreg = (self.shiftreg << 1) & 0xFF_FFFF;
                    self.ctr -= 1;
                }
            }
            ReaderState::WriteAddr => {
                if self.ctr == 0 {
                    self.ctr = if w == 4 { 12 } else { 8 - w };
                    self.state = ReaderState::DataWait;
                } else {
                    self.ctr -= w;
                    self.shiftreg = (self.shiftreg << w) & 0xFF_FFFF;
                }
            }
            ReaderState::DataWait => {
                if self.ctr == 0 {
                    self.ctr = 8 - w;
                    self.state = ReaderState::DataRead;
                } else {
                    self.ctr -= w;
                }
            }
            ReaderState::DataRead => {
                let bits = if w == 1 {
                    u32::from((dq_in >> 1) & 1)
                } else {
                    u32::from(dq_in & ((1 << w) - 1))
                };
                self.shiftreg = ((self.shiftreg << w) | bits) & 0xFF;
                let remaining = self.size;
                if self.ctr == 0 {
                    self.ctr = 8 - w;
                    self.size = self.size.wrapping_sub(1);
                    self.valid = true;
                } else {
                    self.ctr -= w;
                    self.valid = false;
                }
                if remaining == 0 {
                    self.cs = false;
                    self.state = ReaderState::Idle;
                }
            }
        }
    }
}
