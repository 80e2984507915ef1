//! Row buffer
//!
//! Two character rows of glyph bitmaps, one byte per (scanline, column).
//! Even character rows live in the first half, odd rows in the second, so
//! the filler can prefetch row N+1 while row N is being scanned out.

use super::timings::CHAR_HEIGHT;
use crate::signals::RowbufWrite;

#[derive(Debug, Clone)]
pub struct RowBuffer {
    cols: usize,
    mem: Vec<u8>,
}

impl RowBuffer {
    pub fn new(cols: usize) -> Self {
        Self {
            cols,
            mem: vec![0; cols * CHAR_HEIGHT * 2],
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.mem.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mem.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.mem
    }

    /// Byte address of a scanline of a glyph column
    pub fn addr(&self, char_row: usize, scanline: usize, col: usize) -> usize {
        ((char_row & 1) * CHAR_HEIGHT + scanline) * self.cols + col
    }

    /// Read a byte; out-of-range addresses wrap
    pub fn read(&self, addr: usize) -> u8 {
        self.mem[addr % self.mem.len()]
    }

    pub fn write(&mut self, port: RowbufWrite) {
        if port.en {
            let len = self.mem.len();
            self.mem[port.addr % len] = port.data;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halves_alternate_by_row_parity() {
        let rb = RowBuffer::new(80);
        assert_eq!(rb.len(), 80 * 32);
        assert_eq!(rb.addr(0, 0, 0), 0);
        assert_eq!(rb.addr(1, 0, 0), 80 * 16);
        assert_eq!(rb.addr(2, 3, 5), 3 * 80 + 5);
        assert_eq!(rb.addr(7, 15, 79), 80 * 32 - 1);
    }

    #[test]
    fn test_disabled_write_ignored() {
        let mut rb = RowBuffer::new(2);
        rb.write(RowbufWrite {
            addr: 1,
            data: 9,
            en: false,
        });
        assert_eq!(rb.read(1), 0);
        rb.write(RowbufWrite {
            addr: 1,
            data: 9,
            en: true,
        });
        assert_eq!(rb.read(1), 9);
    }
}
