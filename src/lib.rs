//! Uniterm
//!
//! A cycle-accurate model of a small FPGA text terminal: bytes arrive over a
//! UART, are decoded as UTF-8, resolved to glyphs through a table in SPI
//! flash, and scanned out over VGA from a prefetched row buffer.
//!
//! - `signals`: typed port bundles shared between components
//! - `flash`: SPI flash device model, read engine, arbiter, layout and images
//! - `text`: UTF-8 decoder, charmap lookup, glyph buffer, terminal core
//! - `video`: timings, sync, cursor, row filler and scan-out
//! - `serial`: UART and receive FIFO
//! - `platform`: target boards and PLL parameter search
//! - `app`: configuration
//! - `toplevel`: the whole design, clocked one edge at a time

pub mod app;
pub mod capture;
pub mod error;
pub mod flash;
pub mod platform;
pub mod serial;
pub mod signals;
pub mod snapshot;
pub mod text;
pub mod toplevel;
pub mod video;

pub use app::{BuildParams, Config, ConfigError};
pub use capture::FrameCapture;
pub use error::BuildError;
pub use snapshot::Snapshot;
pub use toplevel::{Stats, Toplevel};
