//! SPI NOR flash device model
//!
//! A behavioural model of the external flash chip, clocked by the reader one
//! SPI clock per `sync` cycle while chip-select is asserted. Supports the
//! read opcodes the reader issues plus the plain slow read.

use std::fmt;

/// Slow read, 1-bit, no dummy cycles
pub const READ_ARRAY_SLOW: u8 = 0x03;
/// Fast read, 1-bit, 8 dummy cycles
pub const READ_ARRAY: u8 = 0x0B;
/// Dual I/O fast read, 2-bit address, 4 mode cycles
pub const DUAL_IO_READ: u8 = 0xBB;
/// Quad I/O fast read, 4-bit address, 2 mode + 4 dummy cycles
pub const QUAD_IO_READ: u8 = 0xEB;

const ADDR_MASK: u32 = 0xFF_FFFF;

/// Pin levels driven by the host during one SPI clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpiPins {
    /// Chip select (active high at this level of abstraction)
    pub cs: bool,
    /// Output levels on IO0..IO3 (IO0 doubles as COPI)
    pub dq_out: u8,
    /// Output enables on IO0..IO3
    pub dq_oe: u8,
}

/// Anything that can sit on the far side of the SPI bus.
pub trait SpiDevice {
    /// Advance one SPI clock. Returns the IO0..IO3 levels as seen by the host
    /// for this cycle (IO1 doubles as CIPO).
    fn clock(&mut self, pins: SpiPins) -> u8;
}

/// Phase of the current transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Command { opcode: u8, bits: u8 },
    Address { width: u8, acc: u32, cycles: u8, wait: u8 },
    Wait { width: u8, addr: u32, cycles: u8 },
    Data { width: u8, addr: u32, group: u8 },
    /// Unknown opcode, bus floats until chip-select drops
    Ignore,
}

/// In-memory SPI NOR flash
pub struct SpiFlash {
    image: Vec<u8>,
    phase: Phase,
    /// Number of transactions that reached the data phase
    reads: u64,
}

impl fmt::Debug for SpiFlash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpiFlash")
            .field("size", &self.image.len())
            .field("phase", &self.phase)
            .field("reads", &self.reads)
            .finish()
    }
}

impl SpiFlash {
    /// Create a flash whose first `image.len()` bytes hold `image`; the rest
    /// of the 16 MiB address space reads as erased (0xFF).
    pub fn new(image: Vec<u8>) -> Self {
        Self {
            image,
            phase: Phase::Command { opcode: 0, bits: 0 },
            reads: 0,
        }
    }

    /// Byte stored at `addr`
    pub fn byte(&self, addr: u32) -> u8 {
        self.image
            .get((addr & ADDR_MASK) as usize)
            .copied()
            .unwrap_or(0xFF)
    }

    /// Number of read transactions served so far
    pub fn reads(&self) -> u64 {
        self.reads
    }

    /// Address, mode and dummy timing for a read opcode: (width, wait cycles)
    fn decode(opcode: u8) -> Option<(u8, u8)> {
        match opcode {
            READ_ARRAY_SLOW => Some((1, 0)),
            READ_ARRAY => Some((1, 8)),
            DUAL_IO_READ => Some((2, 4)),
            QUAD_IO_READ => Some((4, 6)),
            _ => None,
        }
    }

    fn data_phase(&mut self, width: u8, addr: u32) -> Phase {
        self.reads += 1;
        Phase::Data {
            width,
            addr,
            group: 0,
        }
    }
}

impl SpiDevice for SpiFlash {
    fn clock(&mut self, pins: SpiPins) -> u8 {
        if !pins.cs {
            self.phase = Phase::Command { opcode: 0, bits: 0 };
            return 0xF;
        }

        match self.phase {
            Phase::Command { opcode, bits } => {
                let opcode = (opcode << 1) | (pins.dq_out & 1);
                self.phase = if bits == 7 {
                    match Self::decode(opcode) {
                        Some((width, wait)) => Phase::Address {
                            width,
                            acc: 0,
                            cycles: 24 / width,
                            wait,
                        },
                        None => {
                            tracing::debug!("flash: ignoring opcode {:#04x}", opcode);
                            Phase::Ignore
                        }
                    }
                } else {
                    Phase::Command {
                        opcode,
                        bits: bits + 1,
                    }
                };
                0xF
            }
            Phase::Address {
                width,
                acc,
                cycles,
                wait,
            } => {
                let mask = (1u8 << width) - 1;
                let acc = (acc << width) | u32::from(pins.dq_out & mask);
                self.phase = if cycles > 1 {
                    Phase::Address {
                        width,
                        acc,
                        cycles: cycles - 1,
                        wait,
                    }
                } else if wait == 0 {
                    self.data_phase(width, acc & ADDR_MASK)
                } else {
                    Phase::Wait {
                        width,
                        addr: acc & ADDR_MASK,
                        cycles: wait,
                    }
                };
                0xF
            }
            Phase::Wait {
                width,
                addr,
                cycles,
            } => {
                self.phase = if cycles > 1 {
                    Phase::Wait {
                        width,
                        addr,
                        cycles: cycles - 1,
                    }
                } else {
                    self.data_phase(width, addr)
                };
                0xF
            }
            Phase::Data { width, addr, group } => {
                let mask = (1u8 << width) - 1;
                let shift = 8 - width * (group + 1);
                let bits = (self.byte(addr) >> shift) & mask;
                let next = group + 1;
                self.phase = if next == 8 / width {
                    Phase::Data {
                        width,
                        addr: (addr + 1) & ADDR_MASK,
                        group: 0,
                    }
                } else {
                    Phase::Data {
                        width,
                        addr,
                        group: next,
                    }
                };
                if width == 1 {
                    // single-bit data comes back on CIPO (IO1)
                    (0xF & !0b10) | (bits << 1)
                } else {
                    (0xF & !mask) | bits
                }
            }
            Phase::Ignore => 0xF,
        }
    }
}
