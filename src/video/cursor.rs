//! Cursor overlay
//!
//! Decides per pixel whether the cursor covers the beam position, then gates
//! the result with a free-running blink oscillator.

use super::timings::Timings;
use crate::signals::{CursorControls, CursorShape, VideoPos};

#[derive(Debug, Clone)]
pub struct Cursor {
    /// Counter value at which the blink phase flips
    half_period: u32,
    ctr: u32,
    on: bool,
}

impl Cursor {
    /// Blink at 1 Hz for the given pixel clock
    pub fn new(timings: &Timings) -> Self {
        Self::with_half_period((timings.pclk_hz() * 0.5) as u32)
    }

    pub fn with_half_period(half_period: u32) -> Self {
        Self {
            half_period,
            ctr: 0,
            on: false,
        }
    }

    /// Current blink phase
    pub fn blink_on(&self) -> bool {
        self.on
    }

    /// Cursor coverage before blinking is applied
    pub fn coverage(controls: &CursorControls, pos: VideoPos) -> bool {
        let col = pos.char_col();
        let row = pos.char_row();
        if row < 0 || row as usize != controls.y || col < 0 {
            return false;
        }
        let col = col as usize;
        let left = col == controls.x;
        let right = if controls.doublewide {
            col == controls.x + 1
        } else {
            left
        };
        if !(left || right) {
            return false;
        }
        let col_pix = pos.col_pix();
        let row_pix = pos.row_pix();
        match controls.shape {
            CursorShape::Solid => true,
            CursorShape::Vertical => left && col_pix == 0,
            CursorShape::Underline => row_pix == 13 || row_pix == 14,
            CursorShape::Box => {
                row_pix == 0 || row_pix == 15 || (left && col_pix == 0) || (right && col_pix == 7)
            }
        }
    }

    /// Overlay bit for this cycle
    pub fn output(&self, controls: &CursorControls, pos: VideoPos) -> bool {
        Self::coverage(controls, pos) && (self.on || !controls.blink)
    }

    /// Advance the blink oscillator one clock
    pub fn step(&mut self) {
        if self.ctr == self.half_period {
            self.ctr = 0;
            self.on = !self.on;
        } else {
            self.ctr += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controls(shape: CursorShape) -> CursorControls {
        CursorControls {
            x: 2,
            y: 1,
            shape,
            blink: false,
            doublewide: false,
        }
    }

    /// Render the cursor cell(s) as 16 rows of pixel columns
    fn cell(c: &CursorControls, width: usize) -> Vec<Vec<bool>> {
        (0..16)
            .map(|r| {
                (0..width * 8)
                    .map(|p| {
                        let pos = VideoPos {
                            hctr: (c.x * 8 + p) as i32,
                            vctr: (c.y * 16 + r) as i32,
                        };
                        Cursor::coverage(c, pos)
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_underline_rows() {
        let rows = cell(&controls(CursorShape::Underline), 1);
        for (r, line) in rows.iter().enumerate() {
            let expect = r == 13 || r == 14;
            assert!(line.iter().all(|&b| b == expect), "row {}", r);
        }
    }

    #[test]
    fn test_vertical_bar() {
        let rows = cell(&controls(CursorShape::Vertical), 1);
        for line in rows {
            assert_eq!(line, [true, false, false, false, false, false, false, false]);
        }
    }

    #[test]
    fn test_box_border() {
        let rows = cell(&controls(CursorShape::Box), 1);
        assert!(rows[0].iter().all(|&b| b));
        assert!(rows[15].iter().all(|&b| b));
        for line in &rows[1..15] {
            assert_eq!(line, &[true, false, false, false, false, false, false, true]);
        }
    }

    #[test]
    fn test_doublewide_box_spans_two_cells() {
        let mut c = controls(CursorShape::Box);
        c.doublewide = true;
        let rows = cell(&c, 2);
        assert!(rows[0].iter().all(|&b| b));
        let mid = &rows[7];
        assert!(mid[0] && mid[15]);
        assert!(!mid[7] && !mid[8]);
    }

    #[test]
    fn test_solid_only_inside_cell() {
        let c = controls(CursorShape::Solid);
        assert!(Cursor::coverage(&c, VideoPos { hctr: 16, vctr: 16 }));
        assert!(!Cursor::coverage(&c, VideoPos { hctr: 15, vctr: 16 }));
        assert!(!Cursor::coverage(&c, VideoPos { hctr: 16, vctr: 32 }));
        assert!(!Cursor::coverage(&c, VideoPos { hctr: -8, vctr: -16 }));
    }

    #[test]
    fn test_blink_gates_output() {
        let mut c = controls(CursorShape::Solid);
        c.blink = true;
        let pos = VideoPos { hctr: 16, vctr: 16 };
        let mut cursor = Cursor::with_half_period(3);
        let mut trace = Vec::new();
        for _ in 0..10 {
            trace.push(cursor.output(&c, pos));
            cursor.step();
        }
        assert_eq!(
            trace,
            [false, false, false, false, true, true, true, true, false, false]
        );
        c.blink = false;
        assert!(cursor.output(&c, pos));
    }
}
