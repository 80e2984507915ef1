//! Flash subsystem
//!
//! Everything between the glyph consumers and the external SPI NOR chip:
//! - `device`: behavioural model of the flash chip
//! - `reader`: the SPI/DSPI/QSPI read engine
//! - `arbiter`: grants the reader to one client at a time
//! - `layout`: where the font tables and charmap live
//! - `image`: builds flash images for simulation

mod arbiter;
mod device;
mod image;
mod layout;
mod reader;

pub use arbiter::{ArbState, FlashArbiter};
pub use device::{
    SpiDevice, SpiFlash, SpiPins, DUAL_IO_READ, QUAD_IO_READ, READ_ARRAY, READ_ARRAY_SLOW,
};
pub use image::FlashImage;
pub use layout::{
    BlockAllocator, FlashLayout, Region, CHARMAP_BYTES, DOUBLEWIDE_FLAG, FONT1_GLYPH_BYTES,
    FONT2_GLYPH_BYTES, MISSING_GLYPH,
};
pub use reader::{FlashReader, ReaderState, ReaderWidth};
