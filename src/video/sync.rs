//! VGA sync generator
//!
//! Free-running horizontal and vertical counters. Outputs are registered, so
//! `pos`, `hs`, `vs` and `active` always describe the same pixel.

use super::timings::Timings;
use crate::signals::VideoPos;

#[derive(Debug, Clone)]
pub struct VgaSync {
    timings: Timings,
    /// Position the counters will present after the next edge
    next: VideoPos,
    pos: VideoPos,
    hs: bool,
    vs: bool,
    active: bool,
}

impl VgaSync {
    pub fn new(timings: Timings) -> Self {
        let start = VideoPos { hctr: 0, vctr: 0 };
        let mut sync = Self {
            timings,
            next: start,
            pos: start,
            hs: false,
            vs: false,
            active: false,
        };
        sync.latch(start);
        sync.next = sync.advance(start);
        sync
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub fn pos(&self) -> VideoPos {
        self.pos
    }

    pub fn hs(&self) -> bool {
        self.hs
    }

    pub fn vs(&self) -> bool {
        self.vs
    }

    /// Beam is inside the visible window on both axes
    pub fn active(&self) -> bool {
        self.active
    }

    fn advance(&self, pos: VideoPos) -> VideoPos {
        let t = &self.timings;
        if pos.hctr == t.hsync_end() - 1 {
            let vctr = if pos.vctr == t.vsync_end() - 1 {
                -t.vback
            } else {
                pos.vctr + 1
            };
            VideoPos {
                hctr: -t.hback,
                vctr,
            }
        } else {
            VideoPos {
                hctr: pos.hctr + 1,
                vctr: pos.vctr,
            }
        }
    }

    fn latch(&mut self, pos: VideoPos) {
        let t = &self.timings;
        self.hs = (t.hsync_start()..t.hsync_end()).contains(&pos.hctr);
        self.vs = (t.vsync_start()..t.vsync_end()).contains(&pos.vctr);
        self.active = (0..t.hactive).contains(&pos.hctr) && (0..t.vactive).contains(&pos.vctr);
        self.pos = pos;
    }

    /// Advance one pixel clock
    pub fn step(&mut self) {
        let pos = self.next;
        self.latch(pos);
        self.next = self.advance(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> Timings {
        Timings {
            pclk: 10.0,
            hactive: 10,
            hfront: 3,
            hsync: 4,
            hback: 4,
            vactive: 6,
            vfront: 2,
            vsync: 1,
            vback: 2,
        }
    }

    #[test]
    fn test_line_wraps_to_back_porch() {
        let mut sync = VgaSync::new(tiny());
        assert_eq!(sync.pos(), VideoPos { hctr: 0, vctr: 0 });
        assert!(sync.active());
        // hctr runs 0..=16 on the first line
        for _ in 0..16 {
            sync.step();
        }
        assert_eq!(sync.pos(), VideoPos { hctr: 16, vctr: 0 });
        sync.step();
        assert_eq!(sync.pos(), VideoPos { hctr: -4, vctr: 1 });
        assert!(!sync.active());
    }

    #[test]
    fn test_frame_period_and_pulses() {
        let t = tiny();
        let mut sync = VgaSync::new(t);
        let total = t.frame_cycles() as usize;
        let (mut hs, mut vs, mut active) = (0, 0, 0);
        for _ in 0..total {
            hs += sync.hs() as usize;
            vs += sync.vs() as usize;
            active += sync.active() as usize;
            sync.step();
        }
        assert_eq!(sync.pos(), VideoPos { hctr: 0, vctr: 0 });
        assert_eq!(active, 10 * 6);
        assert_eq!(hs, 4 * t.vtotal() as usize);
        assert_eq!(vs, t.htotal() as usize);
    }

    #[test]
    fn test_sync_pulse_position() {
        let mut sync = VgaSync::new(tiny());
        while sync.pos().hctr != 13 {
            assert!(!sync.hs());
            sync.step();
        }
        assert!(sync.hs());
    }
}
