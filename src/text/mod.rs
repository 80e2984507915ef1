//! Text path
//!
//! From decoded bytes to glyph ids in the character grid:
//! - `utf8`: streaming byte to codepoint decoder
//! - `charmap`: codepoint to glyph id lookup in flash
//! - `glyphbuf`: the character grid memory
//! - `termcore`: prints glyphs at the cursor

mod charmap;
mod glyphbuf;
mod termcore;
mod utf8;

pub use charmap::{CharMap, CharMapInputs, CharMapState};
pub use glyphbuf::GlyphBuffer;
pub use termcore::{TermCoreInputs, TermCoreOutputs, TermCoreState, TerminalCore};
pub use utf8::{Utf8Decoder, Utf8State};
