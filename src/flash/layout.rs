//! Flash memory layout
//!
//! The font tables and the charmap live at fixed offsets in the flash. Each
//! region is naturally aligned, so addresses are formed by OR-ing a base with
//! a masked index instead of adding.

use serde::{Deserialize, Serialize};

use crate::error::{BuildError, Result};

/// Bytes per single-wide glyph (8x16)
pub const FONT1_GLYPH_BYTES: u32 = 16;
/// Bytes per double-wide glyph (16x16)
pub const FONT2_GLYPH_BYTES: u32 = 32;
/// 65536 little-endian u16 entries
pub const CHARMAP_BYTES: u32 = 0x2_0000;
/// Charmap value for codepoints with no glyph
pub const MISSING_GLYPH: u16 = 0xFFFF;
/// Width flag of a glyph id
pub const DOUBLEWIDE_FLAG: u16 = 0x8000;
/// Bytes reachable with a 24-bit address
pub const FLASH_ADDR_SPACE: u32 = 0x100_0000;

/// One table in flash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub offset: u32,
    pub size: u32,
}

impl Region {
    pub const fn new(offset: u32, size: u32) -> Self {
        Self { offset, size }
    }

    /// Index mask: the size rounded up to a power of two, minus one.
    /// Sizes past 2^31 cover the whole 32-bit space.
    pub fn mask(&self) -> u32 {
        self.size
            .checked_next_power_of_two()
            .map_or(u32::MAX, |size| size - 1)
    }

    /// First address past the region, saturating
    pub fn end(&self) -> u32 {
        self.offset.saturating_add(self.size)
    }

    /// Whether the region lies within the 24-bit flash address space
    pub fn in_range(&self) -> bool {
        self.offset
            .checked_add(self.size)
            .is_some_and(|end| end <= FLASH_ADDR_SPACE)
    }

    pub fn is_aligned(&self) -> bool {
        self.offset & self.mask() == 0
    }
}

/// Placement of the three flash tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashLayout {
    /// Single-wide glyph bitmaps
    pub font1: Region,
    /// Double-wide glyph bitmaps
    pub font2: Region,
    /// Codepoint to glyph id table
    pub charmap: Region,
}

impl Default for FlashLayout {
    fn default() -> Self {
        Self {
            charmap: Region::new(0x02_0000, CHARMAP_BYTES),
            font1: Region::new(0x04_0000, 0x2_0000),
            font2: Region::new(0x08_0000, 0x8_0000),
        }
    }
}

impl FlashLayout {
    /// Check that every region fits the flash and is aligned to its own size
    pub fn validate(&self) -> Result<()> {
        for (name, region) in self.regions() {
            if !region.in_range() {
                return Err(BuildError::RegionOutOfRange {
                    name,
                    offset: region.offset,
                    size: region.size,
                });
            }
            if !region.is_aligned() {
                return Err(BuildError::MisalignedRegion {
                    name,
                    offset: region.offset,
                    size: region.size,
                });
            }
        }
        Ok(())
    }

    fn regions(&self) -> [(&'static str, Region); 3] {
        [
            ("font1", self.font1),
            ("font2", self.font2),
            ("charmap", self.charmap),
        ]
    }

    /// Last byte address covered by any region, plus one
    pub fn end(&self) -> u32 {
        self.regions()
            .iter()
            .map(|(_, r)| r.end())
            .max()
            .unwrap_or(0)
    }

    /// Charmap entry address for a codepoint. Only the low 16 bits of the
    /// codepoint take part, so everything above the BMP aliases.
    pub fn charmap_addr(&self, codepoint: u32) -> u32 {
        self.charmap.offset | (((codepoint & 0xFFFF) << 1) & self.charmap.mask())
    }

    /// Bitmap address of a single-wide glyph
    pub fn font1_addr(&self, glyph: u16) -> u32 {
        self.font1.offset | ((u32::from(glyph) << 4) & self.font1.mask())
    }

    /// Bitmap address of a double-wide glyph; the width flag is dropped
    pub fn font2_addr(&self, glyph: u16) -> u32 {
        self.font2.offset | ((u32::from(glyph & 0x3FFF) << 5) & self.font2.mask())
    }

    /// Pack the three tables between `flash_start` and `flash_end`,
    /// largest first, each into a naturally aligned block.
    pub fn allocate(flash_start: u32, flash_end: u32, font1_size: u32, font2_size: u32) -> Result<Self> {
        let mut alloc = BlockAllocator::new(flash_start, flash_end);
        let mut items = [
            ("font1", font1_size),
            ("font2", font2_size),
            ("charmap", CHARMAP_BYTES),
        ];
        items.sort_by(|a, b| b.1.cmp(&a.1));

        let mut layout = FlashLayout::default();
        for (name, size) in items {
            let region = Region::new(alloc.allocate(size)?, size);
            tracing::debug!("{:06x}\t{:06x}\t{}", region.offset, region.size, name);
            match name {
                "font1" => layout.font1 = region,
                "font2" => layout.font2 = region,
                _ => layout.charmap = region,
            }
        }
        layout.validate()?;
        Ok(layout)
    }
}

/// Allocator handing out naturally aligned power-of-two blocks
#[derive(Debug, Clone)]
pub struct BlockAllocator {
    /// (start, size), kept sorted smallest first
    blocks: Vec<(u32, u32)>,
}

impl BlockAllocator {
    pub fn new(start: u32, end: u32) -> Self {
        let mut blocks = split_aligned(start, end);
        blocks.sort_by_key(|&(_, size)| size);
        Self { blocks }
    }

    /// Free blocks, smallest first
    pub fn blocks(&self) -> &[(u32, u32)] {
        &self.blocks
    }

    /// Take the smallest block that fits `size`, returning its start. The
    /// unused tail of the block goes back to the free list.
    pub fn allocate(&mut self, size: u32) -> Result<u32> {
        let index = self
            .blocks
            .iter()
            .position(|&(_, block)| block >= size)
            .ok_or(BuildError::OutOfFlash(size))?;
        let (start, block) = self.blocks.remove(index);
        self.blocks
            .extend(split_aligned(start + size, start + block));
        self.blocks.sort_by_key(|&(_, size)| size);
        Ok(start)
    }
}

/// Split `[start, end)` into naturally aligned power-of-two blocks: growing
/// while the alignment of `start` allows, then shrinking to fill the tail.
fn split_aligned(start: u32, end: u32) -> Vec<(u32, u32)> {
    let (mut start, end) = (u64::from(start), u64::from(end));
    let mut blocks = Vec::new();
    let align = |s: u64| if s == 0 { 1u64 << 32 } else { 1u64 << s.trailing_zeros() };

    let mut size = align(start);
    while start + size <= end {
        blocks.push((start as u32, size as u32));
        start += size;
        size = align(start);
    }
    size >>= 1;
    while size > 0 {
        if start + size <= end {
            blocks.push((start as u32, size as u32));
            start += size;
        }
        size >>= 1;
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_is_valid() {
        assert_eq!(FlashLayout::default().validate(), Ok(()));
    }

    #[test]
    fn test_misaligned_region_rejected() {
        let layout = FlashLayout {
            font1: Region::new(0x04_8000, 0x2_0000),
            ..FlashLayout::default()
        };
        assert!(matches!(
            layout.validate(),
            Err(BuildError::MisalignedRegion { name: "font1", .. })
        ));
    }

    #[test]
    fn test_oversized_regions_rejected_without_panic() {
        let huge = FlashLayout {
            font2: Region::new(0, 0x8000_0001),
            ..FlashLayout::default()
        };
        assert_eq!(huge.font2.mask(), u32::MAX);
        assert!(matches!(
            huge.validate(),
            Err(BuildError::RegionOutOfRange { name: "font2", .. })
        ));

        let wrapping = FlashLayout {
            charmap: Region::new(0xFFFF_0000, 0x2_0000),
            ..FlashLayout::default()
        };
        assert_eq!(wrapping.charmap.end(), u32::MAX);
        assert!(matches!(
            wrapping.validate(),
            Err(BuildError::RegionOutOfRange { name: "charmap", .. })
        ));

        let past_flash = FlashLayout {
            font2: Region::new(0x100_0000, 0x8_0000),
            ..FlashLayout::default()
        };
        assert!(past_flash.validate().is_err());
    }

    #[test]
    fn test_layout_json_with_hostile_sizes() {
        let json = r#"{
            "font1": {"offset": 0, "size": 4294967295},
            "font2": {"offset": 4294967295, "size": 4294967295},
            "charmap": {"offset": 131072, "size": 131072}
        }"#;
        let layout: FlashLayout = serde_json::from_str(json).unwrap();
        assert!(layout.validate().is_err());
        assert_eq!(layout.end(), u32::MAX);
    }

    #[test]
    fn test_charmap_aliases_above_bmp() {
        let layout = FlashLayout::default();
        assert_eq!(layout.charmap_addr(0x41), 0x02_0082);
        assert_eq!(layout.charmap_addr(0x1_0041), layout.charmap_addr(0x41));
    }

    #[test]
    fn test_glyph_addresses() {
        let layout = FlashLayout::default();
        assert_eq!(layout.font1_addr(5), 0x04_0050);
        assert_eq!(layout.font2_addr(DOUBLEWIDE_FLAG | 3), 0x08_0060);
        // out-of-range ids alias instead of escaping the table
        assert_eq!(layout.font1_addr(0x2001), layout.font1_addr(1));
    }

    #[test]
    fn test_split_aligned() {
        assert_eq!(
            split_aligned(0x2_0000, 0x10_0000),
            vec![(0x2_0000, 0x2_0000), (0x4_0000, 0x4_0000), (0x8_0000, 0x8_0000)]
        );
        assert_eq!(split_aligned(0, 0x3000), vec![(0, 0x2000), (0x2000, 0x1000)]);
    }

    #[test]
    fn test_allocator_exact_fit() {
        let mut alloc = BlockAllocator::new(0x2_0000, 0x10_0000);
        assert_eq!(alloc.allocate(0x2_0000), Ok(0x2_0000));
        assert_eq!(alloc.allocate(0x8_0000), Ok(0x8_0000));
        assert_eq!(alloc.allocate(0x8_0000), Err(BuildError::OutOfFlash(0x8_0000)));
    }

    #[test]
    fn test_allocate_layout() {
        let layout = FlashLayout::allocate(0x5_0000, 0x10_0000, 0x1_8000, 0x4_0000).unwrap();
        assert_eq!(layout.validate(), Ok(()));
        assert!(layout.font2.offset >= 0x5_0000);
        assert!(layout.end() <= 0x10_0000);
        let mut starts = [layout.font1, layout.font2, layout.charmap];
        starts.sort_by_key(|r| r.offset);
        assert!(starts[0].end() <= starts[1].offset);
        assert!(starts[1].end() <= starts[2].offset);
    }
}
