//! Build-time errors
//!
//! These are the only fail-fast errors in the system. Once a design is
//! elaborated, the state machines never fail; bad input is dropped silently
//! and timing overruns only degrade the picture.

use thiserror::Error;

/// Errors raised while resolving build parameters
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    #[error("unknown platform '{0}'")]
    UnknownPlatform(String),

    #[error("unknown resolution '{0}'")]
    UnknownResolution(String),

    #[error("invalid flash reader width {0} (expected 1, 2 or 4)")]
    InvalidReaderWidth(u8),

    #[error("PLL f_in ({0:.3} MHz) out of range")]
    PllInputOutOfRange(f64),

    #[error("PLL f_out ({0:.3} MHz) out of range")]
    PllOutputOutOfRange(f64),

    #[error("PLL f_in ({f_in:.3} MHz)/f_out ({f_out:.3} MHz) has no solution")]
    PllUnsolvable { f_in: f64, f_out: f64 },

    #[error("flash region {name} at {offset:#08x} is not aligned to its size {size:#08x}")]
    MisalignedRegion {
        name: &'static str,
        offset: u32,
        size: u32,
    },

    #[error("flash region {name} at {offset:#08x} (size {size:#x}) runs past the 16 MiB address space")]
    RegionOutOfRange {
        name: &'static str,
        offset: u32,
        size: u32,
    },

    #[error("out of flash blocks, couldn't get size {0:#x}")]
    OutOfFlash(u32),

    #[error("unsupported flash size {0} MiB")]
    UnsupportedFlashSize(u32),

    #[error("baud rate must be non-zero")]
    ZeroBaud,

    #[error("baud rate {baud} is too fast for a {clock_hz} Hz clock")]
    BaudTooFast { baud: u32, clock_hz: u32 },
}

pub type Result<T> = std::result::Result<T, BuildError>;
