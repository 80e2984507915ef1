//! Frame capture
//!
//! Collects the active-region pixels of one frame from the VGA pins, in scan
//! order, and writes them out as a binary PPM.

use std::io::{self, Write};

use crate::video::{Rgb, Timings, VgaOutput};

#[derive(Debug, Clone)]
pub struct FrameCapture {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl FrameCapture {
    pub fn new(timings: &Timings) -> Self {
        let width = timings.hactive as usize;
        let height = timings.vactive as usize;
        Self {
            width,
            height,
            pixels: Vec::with_capacity(width * height),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Take one clock's pins; only data-enabled pixels are kept
    pub fn push(&mut self, out: &VgaOutput) {
        if out.den && !self.is_complete() {
            self.pixels.push(out.rgb());
        }
    }

    pub fn is_complete(&self) -> bool {
        self.pixels.len() == self.width * self.height
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    /// Binary PPM (P6); missing pixels are black
    pub fn write_ppm<W: Write>(&self, mut w: W) -> io::Result<()> {
        write!(w, "P6\n{} {}\n255\n", self.width, self.height)?;
        let mut body = Vec::with_capacity(self.width * self.height * 3);
        for i in 0..self.width * self.height {
            let Rgb(r, g, b) = self.pixels.get(i).copied().unwrap_or(Rgb::BLACK);
            body.extend_from_slice(&[r, g, b]);
        }
        w.write_all(&body)
    }
}
