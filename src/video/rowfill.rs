//! Row filler
//!
//! Prefetches one character row of glyph bitmaps into the row buffer. For
//! each column it reads the glyph id from the glyph buffer, fetches 16 bytes
//! (single-wide) or 32 bytes (double-wide) from flash and scatters them into
//! the row buffer, one byte per scanline. A double-wide glyph covers two
//! columns; its bytes alternate between the left and the right column.
//!
//! The arbiter request is held for the whole row so the charmap cannot slip
//! in between glyphs.

use super::rowbuf::RowBuffer;
use super::timings::CHAR_HEIGHT;
use crate::flash::{FlashLayout, DOUBLEWIDE_FLAG, FONT1_GLYPH_BYTES, FONT2_GLYPH_BYTES};
use crate::signals::{ArbClient, FlashBus, FlashReply, GbufRead, RowbufWrite};

/// Filler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFillState {
    Idle,
    /// Waiting for the arbiter grant
    WaitFlash,
    /// Issuing the bitmap read for the current glyph
    RequestRead,
    /// Streaming a single-wide glyph
    Copy,
    /// Streaming the left byte of a double-wide scanline
    CopyW1,
    /// Streaming the right byte of a double-wide scanline
    CopyW2,
}

/// Inputs sampled each cycle
#[derive(Debug, Clone, Copy, Default)]
pub struct RowFillInputs {
    /// First pixel of a character row: start prefetching `char_row`
    pub start_fill: bool,
    pub char_row: usize,
    /// Glyph buffer read port data
    pub gbuf_data: u16,
    /// Arbiter grant
    pub ok: bool,
    pub reply: FlashReply,
}

/// Combinational outputs of one cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowFillOutputs {
    pub gbuf: GbufRead,
    pub flash: ArbClient,
    pub rowbuf: RowbufWrite,
}

#[derive(Debug, Clone)]
pub struct RowFiller {
    layout: FlashLayout,
    cols: usize,
    state: RowFillState,
    request: bool,
    char_row: usize,
    charctr: usize,
    rowctr: usize,
    fills: u64,
}

impl RowFiller {
    pub fn new(layout: FlashLayout, cols: usize) -> Self {
        Self {
            layout,
            cols,
            state: RowFillState::Idle,
            request: false,
            char_row: 0,
            charctr: 0,
            rowctr: 0,
            fills: 0,
        }
    }

    pub fn state(&self) -> RowFillState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == RowFillState::Idle
    }

    /// Character row being (or last) filled
    pub fn char_row(&self) -> usize {
        self.char_row
    }

    /// Completed row fills
    pub fn fills(&self) -> u64 {
        self.fills
    }

    fn rowbuf_addr(&self, col: usize) -> usize {
        ((self.char_row & 1) * CHAR_HEIGHT + self.rowctr) * self.cols + col
    }

    fn read_glyph(&self, col: usize) -> GbufRead {
        GbufRead {
            row: self.char_row,
            col,
            en: true,
        }
    }

    /// Move on by `width` columns once a glyph is complete
    fn next_glyph(&mut self, width: usize, out: &mut RowFillOutputs) {
        let next = self.charctr + width;
        if next >= self.cols {
            tracing::trace!("row {} filled", self.char_row);
            self.fills += 1;
            self.request = false;
            self.state = RowFillState::Idle;
        } else {
            self.charctr = next;
            out.gbuf = self.read_glyph(next);
            self.state = RowFillState::RequestRead;
        }
    }

    /// Advance one clock
    pub fn step(&mut self, inputs: RowFillInputs) -> RowFillOutputs {
        let mut out = RowFillOutputs {
            flash: ArbClient {
                request: self.request,
                bus: FlashBus::default(),
            },
            rowbuf: RowbufWrite {
                addr: 0,
                data: inputs.reply.data,
                en: false,
            },
            ..Default::default()
        };
        let valid = inputs.reply.valid;

        match self.state {
            RowFillState::Idle => {
                if inputs.start_fill {
                    self.char_row = inputs.char_row;
                    self.charctr = 0;
                    self.request = true;
                    out.gbuf = self.read_glyph(0);
                    self.state = RowFillState::WaitFlash;
                }
            }
            RowFillState::WaitFlash => {
                if inputs.ok {
                    self.state = RowFillState::RequestRead;
                }
            }
            RowFillState::RequestRead => {
                let glyph = inputs.gbuf_data;
                let wide = glyph & DOUBLEWIDE_FLAG != 0;
                out.flash.bus = if wide {
                    FlashBus {
                        addr: self.layout.font2_addr(glyph),
                        read_size: FONT2_GLYPH_BYTES as u16,
                        read_trigger: true,
                    }
                } else {
                    FlashBus {
                        addr: self.layout.font1_addr(glyph),
                        read_size: FONT1_GLYPH_BYTES as u16,
                        read_trigger: true,
                    }
                };
                self.rowctr = 0;
                self.state = if wide {
                    RowFillState::CopyW1
                } else {
                    RowFillState::Copy
                };
            }
            RowFillState::Copy => {
                out.rowbuf.addr = self.rowbuf_addr(self.charctr);
                out.rowbuf.en = valid;
                if valid {
                    if self.rowctr == CHAR_HEIGHT - 1 {
                        self.next_glyph(1, &mut out);
                    } else {
                        self.rowctr += 1;
                    }
                }
            }
            RowFillState::CopyW1 => {
                out.rowbuf.addr = self.rowbuf_addr(self.charctr);
                out.rowbuf.en = valid;
                if valid {
                    self.state = RowFillState::CopyW2;
                }
            }
            RowFillState::CopyW2 => {
                // the right half falls off the edge in the last column
                let col = self.charctr + 1;
                out.rowbuf.addr = self.rowbuf_addr(col);
                out.rowbuf.en = valid && col < self.cols;
                if valid {
                    if self.rowctr == CHAR_HEIGHT - 1 {
                        self.next_glyph(2, &mut out);
                    } else {
                        self.rowctr += 1;
                        self.state = RowFillState::CopyW1;
                    }
                }
            }
        }

        out
    }
}

/// Fill a row buffer directly from glyph ids and flash bytes, bypassing the
/// bus timing. Used as the reference for the clocked filler.
pub fn reference_fill(
    rowbuf: &mut RowBuffer,
    char_row: usize,
    glyphs: &[u16],
    bitmap: impl Fn(u16) -> Vec<u8>,
) {
    let cols = rowbuf.cols();
    let mut col = 0;
    while col < cols {
        let glyph = glyphs[col];
        let bytes = bitmap(glyph);
        let wide = glyph & DOUBLEWIDE_FLAG != 0;
        for scanline in 0..CHAR_HEIGHT {
            if wide {
                for half in 0..2 {
                    if col + half < cols {
                        rowbuf.write(RowbufWrite {
                            addr: rowbuf.addr(char_row, scanline, col + half),
                            data: bytes[scanline * 2 + half],
                            en: true,
                        });
                    }
                }
            } else {
                rowbuf.write(RowbufWrite {
                    addr: rowbuf.addr(char_row, scanline, col),
                    data: bytes[scanline],
                    en: true,
                });
            }
        }
        col += if wide { 2 } else { 1 };
    }
}
