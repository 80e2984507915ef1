//! Serialisable view of the character grid

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::signals::CursorControls;
use crate::toplevel::{Stats, Toplevel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub rows: usize,
    pub cols: usize,
    pub cursor: CursorControls,
    /// Glyph ids, one vector per row
    pub glyphs: Vec<Vec<u16>>,
    pub stats: Stats,
}

impl Snapshot {
    pub fn capture(top: &Toplevel) -> Self {
        let gbuf = top.glyph_buffer();
        let glyphs = gbuf
            .cells()
            .chunks(gbuf.cols())
            .map(|row| row.to_vec())
            .collect();
        Self {
            rows: gbuf.rows(),
            cols: gbuf.cols(),
            cursor: top.cursor(),
            glyphs,
            stats: top.stats(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Grid as hex glyph ids, blank rows skipped, cursor cell bracketed
    pub fn render_hex(&self) -> String {
        let mut out = String::new();
        for (y, row) in self.glyphs.iter().enumerate() {
            let has_cursor = y == self.cursor.y;
            if !has_cursor && row.iter().all(|&g| g == 0) {
                continue;
            }
            let _ = write!(out, "{:2}:", y);
            for (x, glyph) in row.iter().enumerate() {
                if has_cursor && x == self.cursor.x {
                    let _ = write!(out, "[{:04x}]", glyph);
                } else {
                    let _ = write!(out, " {:04x} ", glyph);
                }
            }
            out.push('\n');
        }
        out
    }
}
