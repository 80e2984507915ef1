//! Glyph buffer
//!
//! The character grid: one 16-bit glyph id per (row, col) cell, stored
//! row-major. The read and write ports share one physical memory; when both
//! are enabled in the same cycle the read wins and the write is dropped
//! without `ack`, so writers must hold their request until acknowledged.

use crate::signals::{GbufRead, GbufWrite};

#[derive(Debug, Clone)]
pub struct GlyphBuffer {
    rows: usize,
    cols: usize,
    mem: Vec<u16>,
    /// Read port output register, updated only on enabled reads
    read_data: u16,
}

impl GlyphBuffer {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            mem: vec![0; rows * cols],
            read_data: 0,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Flattened index; coordinates outside the grid alias back into it
    fn index(&self, row: usize, col: usize) -> usize {
        (row % self.rows) * self.cols + (col % self.cols)
    }

    /// Read port data, one cycle after an enabled read
    pub fn read_data(&self) -> u16 {
        self.read_data
    }

    /// Peek a cell without going through the ports
    pub fn cell(&self, row: usize, col: usize) -> u16 {
        self.mem[self.index(row, col)]
    }

    /// Whole grid, row-major
    pub fn cells(&self) -> &[u16] {
        &self.mem
    }

    /// Write acknowledge for this cycle's port requests
    pub fn write_ack(read: &GbufRead, write: &GbufWrite) -> bool {
        write.en && !read.en
    }

    /// Advance one clock. Returns the write acknowledge.
    pub fn step(&mut self, read: GbufRead, write: GbufWrite) -> bool {
        let ack = Self::write_ack(&read, &write);
        if read.en {
            self.read_data = self.mem[self.index(read.row, read.col)];
        }
        if ack {
            let index = self.index(write.row, write.col);
            self.mem[index] = write.data;
        }
        ack
    }
}
