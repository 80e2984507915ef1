//! Signal bundles
//!
//! Typed interface structs shared between components. Each struct groups the
//! signals of one port, named from the point of view of the component that
//! drives the request side. Components consume these by value once per clock.

use serde::{Deserialize, Serialize};

/// Request side of a flash read: driven by a client, consumed by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlashBus {
    /// 24-bit flash byte address
    pub addr: u32,
    /// Number of bytes to stream
    pub read_size: u16,
    /// Single-cycle pulse starting a read (sampled only while the reader is idle)
    pub read_trigger: bool,
}

/// Response side of a flash read: driven by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlashReply {
    /// Last byte shifted in
    pub data: u8,
    /// High for one cycle per completed byte
    pub valid: bool,
}

/// An arbiter client slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArbClient {
    /// Held high for as long as the client wants the flash
    pub request: bool,
    /// Bus fields forwarded to the reader while granted
    pub bus: FlashBus,
}

/// Ready/ack stream handshake. `rdy` with `data` is driven by the producer;
/// the consumer answers with `ack` in the same cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stream<T> {
    pub data: T,
    pub rdy: bool,
}

impl<T> Stream<T> {
    pub fn ready(data: T) -> Self {
        Self { data, rdy: true }
    }
}

/// Glyph buffer read port request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GbufRead {
    pub row: usize,
    pub col: usize,
    pub en: bool,
}

/// Glyph buffer write port request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GbufWrite {
    pub row: usize,
    pub col: usize,
    pub en: bool,
    pub data: u16,
}

/// Row buffer write port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowbufWrite {
    pub addr: usize,
    pub data: u8,
    pub en: bool,
}

/// Current beam position as seen by consumers of the sync generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoPos {
    /// Horizontal pixel counter; negative in the back porch
    pub hctr: i32,
    /// Vertical line counter; negative in the back porch
    pub vctr: i32,
}

impl VideoPos {
    /// Character column under the beam (arithmetic shift, so negative in the porch)
    pub fn char_col(&self) -> i32 {
        self.hctr >> 3
    }

    /// Character row under the beam
    pub fn char_row(&self) -> i32 {
        self.vctr >> 4
    }

    /// Pixel column inside the current glyph cell
    pub fn col_pix(&self) -> u32 {
        (self.hctr & 0x7) as u32
    }

    /// Scanline inside the current glyph cell
    pub fn row_pix(&self) -> u32 {
        (self.vctr & 0xF) as u32
    }
}

/// Cursor overlay shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorShape {
    /// Scanlines 13 and 14 of the cell
    Underline,
    /// Entire cell
    Solid,
    /// Leftmost pixel column
    Vertical,
    /// Cell border only
    #[default]
    Box,
}

/// Cursor controls, driven by the terminal core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorControls {
    pub x: usize,
    pub y: usize,
    pub shape: CursorShape,
    pub blink: bool,
    pub doublewide: bool,
}

impl Default for CursorControls {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            shape: CursorShape::Box,
            blink: true,
            doublewide: false,
        }
    }
}
