//! Terminal core
//!
//! Takes decoded codepoints, resolves each through the charmap and writes
//! the glyph id at the cursor, then advances the cursor in raster order with
//! wraparound. Comes out of reset sweeping the whole glyph buffer to zero.

use crate::signals::{CursorControls, CursorShape, GbufWrite, Stream};

/// Core state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermCoreState {
    /// Clearing the glyph buffer
    Reset,
    /// Waiting for a codepoint
    Idle,
    /// Waiting for the charmap lookup
    CharmapWait,
    /// Writing the glyph id at the cursor
    Print,
}

/// Inputs sampled each cycle
#[derive(Debug, Clone, Copy, Default)]
pub struct TermCoreInputs {
    /// Decoded codepoint stream
    pub serial: Stream<u32>,
    /// Charmap lookup finished
    pub charmap_valid: bool,
    /// Glyph buffer write acknowledge
    pub gbuf_ack: bool,
}

/// Combinational outputs of one cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TermCoreOutputs {
    /// Acknowledge for the codepoint stream
    pub serial_ack: bool,
    /// Start pulse for the charmap
    pub charmap_en: bool,
}

#[derive(Debug, Clone)]
pub struct TerminalCore {
    rows: usize,
    cols: usize,
    state: TermCoreState,
    cursor: CursorControls,
    codepoint: u32,
}

impl TerminalCore {
    pub fn new(rows: usize, cols: usize, shape: CursorShape, blink: bool) -> Self {
        Self {
            rows,
            cols,
            state: TermCoreState::Reset,
            cursor: CursorControls {
                shape,
                blink,
                ..CursorControls::default()
            },
            codepoint: 0,
        }
    }

    pub fn state(&self) -> TermCoreState {
        self.state
    }

    /// Cursor controls driven to the video side
    pub fn cursor(&self) -> CursorControls {
        self.cursor
    }

    /// Codepoint register feeding the charmap
    pub fn codepoint(&self) -> u32 {
        self.codepoint
    }

    /// Glyph buffer write request for this cycle, given the charmap result
    pub fn gbuf_write(&self, glyphid: u16) -> GbufWrite {
        let (en, data) = match self.state {
            TermCoreState::Reset => (true, 0),
            TermCoreState::Print => (true, glyphid),
            _ => (false, glyphid),
        };
        GbufWrite {
            row: self.cursor.y,
            col: self.cursor.x,
            en,
            data,
        }
    }

    /// Raster advance with wraparound; returns true on wrapping back to (0, 0)
    fn advance_cursor(&mut self) -> bool {
        if self.cursor.x + 1 < self.cols {
            self.cursor.x += 1;
            return false;
        }
        self.cursor.x = 0;
        if self.cursor.y + 1 < self.rows {
            self.cursor.y += 1;
            false
        } else {
            self.cursor.y = 0;
            true
        }
    }

    /// Advance one clock
    pub fn step(&mut self, inputs: TermCoreInputs) -> TermCoreOutputs {
        let mut out = TermCoreOutputs::default();

        match self.state {
            TermCoreState::Reset => {
                if inputs.gbuf_ack && self.advance_cursor() {
                    tracing::debug!("glyph buffer cleared ({}x{})", self.cols, self.rows);
                    self.state = TermCoreState::Idle;
                }
            }
            TermCoreState::Idle => {
                if inputs.serial.rdy {
                    out.serial_ack = true;
                    out.charmap_en = true;
                    self.codepoint = inputs.serial.data;
                    tracing::trace!("codepoint U+{:04X}", inputs.serial.data);
                    self.state = TermCoreState::CharmapWait;
                }
            }
            TermCoreState::CharmapWait => {
                if inputs.charmap_valid {
                    self.state = TermCoreState::Print;
                }
            }
            TermCoreState::Print => {
                if inputs.gbuf_ack {
                    self.advance_cursor();
                    self.state = TermCoreState::Idle;
                }
            }
        }

        out
    }
}
