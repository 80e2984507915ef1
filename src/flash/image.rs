//! In-memory flash image builder
//!
//! Produces the same byte layout the font build tooling writes to the chip:
//! erased (0xFF) everywhere except the tables. Bitmap bytes have the leftmost
//! pixel in bit 0. Double-wide glyphs store each scanline as a left byte
//! followed by a right byte.

use super::layout::{FlashLayout, DOUBLEWIDE_FLAG, MISSING_GLYPH};

#[derive(Debug, Clone)]
pub struct FlashImage {
    layout: FlashLayout,
    data: Vec<u8>,
}

impl FlashImage {
    /// An erased image large enough to hold every region of `layout`
    pub fn new(layout: FlashLayout) -> Self {
        Self {
            layout,
            data: vec![0xFF; layout.end() as usize],
        }
    }

    /// Wrap a raw image read from disk
    pub fn from_bytes(layout: FlashLayout, data: Vec<u8>) -> Self {
        Self { layout, data }
    }

    pub fn layout(&self) -> &FlashLayout {
        &self.layout
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    fn write(&mut self, addr: u32, bytes: &[u8]) {
        let start = addr as usize;
        let end = start + bytes.len();
        if self.data.len() < end {
            self.data.resize(end, 0xFF);
        }
        self.data[start..end].copy_from_slice(bytes);
    }

    /// Map a codepoint to a glyph id
    pub fn set_charmap(&mut self, codepoint: u32, glyph: u16) {
        let addr = self.layout.charmap_addr(codepoint);
        self.write(addr, &glyph.to_le_bytes());
    }

    /// Glyph id stored for a codepoint
    pub fn charmap(&self, codepoint: u32) -> u16 {
        let addr = self.layout.charmap_addr(codepoint) as usize;
        match self.data.get(addr..addr + 2) {
            Some(b) => u16::from_le_bytes([b[0], b[1]]),
            None => MISSING_GLYPH,
        }
    }

    /// Store a single-wide bitmap
    pub fn set_glyph(&mut self, glyph: u16, bitmap: &[u8; 16]) {
        let addr = self.layout.font1_addr(glyph);
        self.write(addr, bitmap);
    }

    /// Store a double-wide bitmap (interleaved left/right per scanline)
    pub fn set_wide_glyph(&mut self, glyph: u16, bitmap: &[u8; 32]) {
        let addr = self.layout.font2_addr(glyph | DOUBLEWIDE_FLAG);
        self.write(addr, bitmap);
    }

    /// An image with a synthetic font: printable ASCII maps to glyph id
    /// equal to its codepoint, drawn as vertical stripes spelling out the
    /// code bits. Glyph 0 and the space are blank.
    pub fn test_pattern(layout: FlashLayout) -> Self {
        let mut image = Self::new(layout);
        image.set_glyph(0, &[0; 16]);
        for cp in 0x20u8..0x7F {
            let mut bitmap = [0u8; 16];
            if cp != b' ' {
                bitmap[3..13].fill(cp);
            }
            image.set_glyph(u16::from(cp), &bitmap);
            image.set_charmap(u32::from(cp), u16::from(cp));
        }
        image
    }

    /// Bitmap bytes a glyph id resolves to
    pub fn glyph_bitmap(&self, glyph: u16) -> Vec<u8> {
        let (addr, len) = if glyph & DOUBLEWIDE_FLAG != 0 {
            (self.layout.font2_addr(glyph), 32)
        } else {
            (self.layout.font1_addr(glyph), 16)
        };
        (0..len)
            .map(|i| self.data.get(addr as usize + i).copied().unwrap_or(0xFF))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_image_is_erased() {
        let image = FlashImage::new(FlashLayout::default());
        assert_eq!(image.as_bytes().len(), 0x10_0000);
        assert!(image.as_bytes().iter().all(|&b| b == 0xFF));
        assert_eq!(image.charmap(0x41), MISSING_GLYPH);
    }

    #[test]
    fn test_charmap_is_little_endian() {
        let mut image = FlashImage::new(FlashLayout::default());
        image.set_charmap(0x41, 0x1234);
        assert_eq!(image.as_bytes()[0x02_0082], 0x34);
        assert_eq!(image.as_bytes()[0x02_0083], 0x12);
        assert_eq!(image.charmap(0x41), 0x1234);
    }

    #[test]
    fn test_glyph_bitmaps() {
        let mut image = FlashImage::new(FlashLayout::default());
        image.set_glyph(7, &[0xAA; 16]);
        let mut wide = [0u8; 32];
        wide[1] = 0x80;
        image.set_wide_glyph(2, &wide);
        assert_eq!(image.glyph_bitmap(7), vec![0xAA; 16]);
        assert_eq!(image.glyph_bitmap(DOUBLEWIDE_FLAG | 2)[1], 0x80);
    }

    #[test]
    fn test_pattern_font() {
        let image = FlashImage::test_pattern(FlashLayout::default());
        assert_eq!(image.charmap(u32::from(b'A')), 0x41);
        assert_eq!(image.glyph_bitmap(0x41)[5], 0x41);
        assert!(image.glyph_bitmap(0x20).iter().all(|&b| b == 0));
        assert!(image.glyph_bitmap(0).iter().all(|&b| b == 0));
        assert_eq!(image.charmap(0x80), MISSING_GLYPH);
    }
}
