//! Video path
//!
//! - `timings`: display mode descriptors
//! - `sync`: horizontal and vertical counters
//! - `cursor`: cursor overlay and blink
//! - `rowbuf`: double-buffered glyph scanline memory
//! - `rowfill`: prefetches the next character row from flash
//! - `out`: scan-out to RGB and sync pins

mod cursor;
mod out;
mod rowbuf;
mod rowfill;
mod sync;
mod timings;

pub use cursor::Cursor;
pub use out::{Rgb, VgaOutput, VideoOut};
pub use rowbuf::RowBuffer;
pub use rowfill::{reference_fill, RowFillInputs, RowFillOutputs, RowFillState, RowFiller};
pub use sync::VgaSync;
pub use timings::{Timings, CHAR_HEIGHT, CHAR_WIDTH, PROFILES};
