//! Display timing descriptors
//!
//! A `Timings` value fixes the counter ranges of the whole video pipeline and
//! the size of the character grid. Counters run from minus the back porch up
//! to the end of the sync pulse, so the active region starts at zero.

use serde::{Deserialize, Serialize};

use crate::error::{BuildError, Result};

/// Glyph cell width in pixels
pub const CHAR_WIDTH: usize = 8;
/// Glyph cell height in scanlines
pub const CHAR_HEIGHT: usize = 16;

/// Names accepted by [`Timings::profile`]
pub const PROFILES: [&str; 3] = ["640x480", "800x480", "800x480_RB"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timings {
    /// Pixel clock in MHz
    pub pclk: f64,
    pub hactive: i32,
    pub hfront: i32,
    pub hsync: i32,
    pub hback: i32,
    pub vactive: i32,
    pub vfront: i32,
    pub vsync: i32,
    pub vback: i32,
}

impl Timings {
    /// Look up a standard display mode by name
    pub fn profile(name: &str) -> Result<Self> {
        let t = match name {
            "640x480" => Timings {
                pclk: 25.175,
                hactive: 640,
                hfront: 16,
                hsync: 96,
                hback: 48,
                vactive: 480,
                vfront: 10,
                vsync: 2,
                vback: 33,
            },
            "800x480" => Timings {
                pclk: 33.33,
                hactive: 800,
                hfront: 210,
                hsync: 40,
                hback: 46,
                vactive: 480,
                vfront: 22,
                vsync: 1,
                vback: 23,
            },
            "800x480_RB" => Timings {
                pclk: 27.686,
                hactive: 800,
                hfront: 40,
                hsync: 10,
                hback: 46,
                vactive: 480,
                vfront: 10,
                vsync: 2,
                vback: 23,
            },
            other => return Err(BuildError::UnknownResolution(other.to_string())),
        };
        Ok(t)
    }

    pub fn htotal(&self) -> i32 {
        self.hactive + self.hfront + self.hsync + self.hback
    }

    pub fn vtotal(&self) -> i32 {
        self.vactive + self.vfront + self.vsync + self.vback
    }

    pub fn hsync_start(&self) -> i32 {
        self.hactive + self.hfront
    }

    pub fn hsync_end(&self) -> i32 {
        self.hsync_start() + self.hsync
    }

    pub fn vsync_start(&self) -> i32 {
        self.vactive + self.vfront
    }

    pub fn vsync_end(&self) -> i32 {
        self.vsync_start() + self.vsync
    }

    /// Character columns
    pub fn cols(&self) -> usize {
        self.hactive as usize / CHAR_WIDTH
    }

    /// Character rows
    pub fn rows(&self) -> usize {
        self.vactive as usize / CHAR_HEIGHT
    }

    /// Pixel clocks per frame
    pub fn frame_cycles(&self) -> u64 {
        self.htotal() as u64 * self.vtotal() as u64
    }

    /// Pixel clock in Hz
    pub fn pclk_hz(&self) -> f64 {
        self.pclk * 1e6
    }

    /// Cycles available to prefetch one character row
    pub fn fill_budget(&self) -> u64 {
        self.htotal() as u64 * CHAR_HEIGHT as u64
    }
}
