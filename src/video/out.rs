//! Video scan-out
//!
//! Reads the row buffer byte under the beam, picks out the pixel bit, XORs it
//! with the cursor overlay and drives the colour outputs. The row buffer read
//! is registered, so every output is one pixel behind the sync counters;
//! `hs`, `vs` and `den` are delayed by a clock to stay aligned.

use serde::{Deserialize, Serialize};

use super::cursor::Cursor;
use super::rowbuf::RowBuffer;
use super::sync::VgaSync;
use super::timings::Timings;
use crate::signals::{CursorControls, VideoPos};

/// An RGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(0xFF, 0xFF, 0xFF);
}

/// Pins driven towards the display each pixel clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VgaOutput {
    pub hs: bool,
    pub vs: bool,
    /// Data enable
    pub den: bool,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl VgaOutput {
    pub fn rgb(&self) -> Rgb {
        Rgb(self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone)]
pub struct VideoOut {
    sync: VgaSync,
    cursor: Cursor,
    fg: Rgb,
    bg: Rgb,
    rowbuf_data: u8,
    active1: bool,
    cursorval: bool,
    hs: bool,
    vs: bool,
}

impl VideoOut {
    pub fn new(timings: Timings, fg: Rgb, bg: Rgb) -> Self {
        Self {
            cursor: Cursor::new(&timings),
            sync: VgaSync::new(timings),
            fg,
            bg,
            rowbuf_data: 0,
            active1: false,
            cursorval: false,
            hs: false,
            vs: false,
        }
    }

    /// Replace the blink oscillator, mostly for tests
    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn timings(&self) -> &Timings {
        self.sync.timings()
    }

    /// Beam position of the sync counters
    pub fn pos(&self) -> VideoPos {
        self.sync.pos()
    }

    pub fn sync(&self) -> &VgaSync {
        &self.sync
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Outputs for this cycle
    pub fn output(&self) -> VgaOutput {
        let shift = (self.sync.pos().hctr - 1) & 7;
        let bit = (self.rowbuf_data >> shift) & 1 != 0;
        let Rgb(r, g, b) = match (self.active1, self.cursorval ^ bit) {
            (false, _) => Rgb::BLACK,
            (true, true) => self.fg,
            (true, false) => self.bg,
        };
        VgaOutput {
            hs: self.hs,
            vs: self.vs,
            den: self.active1,
            r,
            g,
            b,
        }
    }

    /// Advance one clock
    pub fn step(&mut self, rowbuf: &RowBuffer, controls: &CursorControls) {
        let pos = self.sync.pos();
        let active = self.sync.active();
        if active {
            let addr = (pos.vctr & 31) as usize * rowbuf.cols() + (pos.hctr >> 3) as usize;
            self.rowbuf_data = rowbuf.read(addr);
        }
        self.active1 = active;
        self.cursorval = self.cursor.output(controls, pos);
        self.hs = self.sync.hs();
        self.vs = self.sync.vs();

        self.sync.step();
        self.cursor.step();
    }
}
