//! The whole terminal, clocked as one design
//!
//! Owns every component and wires them together the way the gateware does:
//!
//! ```text
//! host UART -> BufSerial -> Utf8Decoder -> TerminalCore -> GlyphBuffer
//!                                              |               |
//!                                           CharMap        RowFiller -> RowBuffer -> VideoOut
//!                                              \               /
//!                                               FlashArbiter -> FlashReader -> SpiFlash
//! ```
//!
//! Each call to [`Toplevel::step`] is one rising edge of the `sync` clock.
//! All registered outputs are sampled first, then every component commits
//! its next state from those pre-edge values. Nothing drives the serial
//! transmit stream, so the TX line idles high.

use serde::{Deserialize, Serialize};

use crate::app::BuildParams;
use crate::capture::FrameCapture;
use crate::flash::{FlashArbiter, FlashImage, FlashLayout, FlashReader, SpiFlash};
use crate::serial::{BufSerial, SerialInputs, UartTx};
use crate::signals::{CursorControls, VideoPos};
use crate::text::{
    CharMap, CharMapInputs, GlyphBuffer, TermCoreInputs, TermCoreState, TerminalCore,
    Utf8Decoder, Utf8State,
};
use crate::video::{RowBuffer, RowFillInputs, RowFiller, Timings, VgaOutput, VideoOut};

/// Arbiter slot of the row filler; first in line
pub const ROWFILL_CLIENT: usize = 0;
/// Arbiter slot of the charmap
pub const CHARMAP_CLIENT: usize = 1;

/// Running counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub cycles: u64,
    pub frames: u64,
    /// Codepoints accepted by the terminal core
    pub codepoints: u64,
    /// Glyph ids written at the cursor
    pub glyphs_printed: u64,
    pub fills_started: u64,
    /// Fills requested while the previous one was still running
    pub fill_overruns: u64,
}

#[derive(Debug)]
pub struct Toplevel {
    timings: Timings,
    host: UartTx,
    serial: BufSerial,
    utf8: Utf8Decoder,
    termcore: TerminalCore,
    charmap: CharMap,
    gbuf: GlyphBuffer,
    filler: RowFiller,
    arbiter: FlashArbiter<SpiFlash>,
    rowbuf: RowBuffer,
    video: VideoOut,
    stats: Stats,
}

impl Toplevel {
    pub fn new(params: &BuildParams, image: FlashImage) -> Self {
        let timings = params.timings;
        let (rows, cols) = (timings.rows(), timings.cols());
        let layout: FlashLayout = *image.layout();
        let reader = FlashReader::new(params.reader_width, SpiFlash::new(image.into_bytes()));

        tracing::debug!(
            "toplevel {}x{} chars, htotal {} vtotal {}, uart divisor {}",
            cols,
            rows,
            timings.htotal(),
            timings.vtotal(),
            params.divisor
        );

        Self {
            timings,
            host: UartTx::new(params.divisor),
            serial: BufSerial::new(params.divisor),
            utf8: Utf8Decoder::new(),
            termcore: TerminalCore::new(rows, cols, params.cursor.shape, params.cursor.blink),
            charmap: CharMap::new(layout),
            gbuf: GlyphBuffer::new(rows, cols),
            filler: RowFiller::new(layout, cols),
            arbiter: FlashArbiter::new(reader, 2),
            rowbuf: RowBuffer::new(cols),
            video: VideoOut::new(timings, params.foreground, params.background),
            stats: Stats::default(),
        }
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn glyph_buffer(&self) -> &GlyphBuffer {
        &self.gbuf
    }

    pub fn row_buffer(&self) -> &RowBuffer {
        &self.rowbuf
    }

    pub fn cursor(&self) -> CursorControls {
        self.termcore.cursor()
    }

    pub fn terminal_core(&self) -> &TerminalCore {
        &self.termcore
    }

    pub fn row_filler(&self) -> &RowFiller {
        &self.filler
    }

    pub fn serial(&self) -> &BufSerial {
        &self.serial
    }

    pub fn flash(&self) -> &SpiFlash {
        self.arbiter.reader().device()
    }

    /// Beam position of the sync counters
    pub fn pos(&self) -> VideoPos {
        self.video.pos()
    }

    /// Queue bytes on the host end of the serial line
    pub fn send(&mut self, bytes: &[u8]) {
        self.host.send(bytes);
    }

    /// Reset sweep done and every queued byte printed
    pub fn is_settled(&self) -> bool {
        self.host.is_idle()
            && self.serial.rx().is_idle()
            && !self.serial.output().rdy
            && self.utf8.state() == Utf8State::Idle
            && self.termcore.state() == TermCoreState::Idle
            && self.charmap.is_idle()
    }

    /// Prefetch trigger for this cycle: the first pixel of each character
    /// row starts the fill of the row below it, if that row exists.
    fn fill_request(&self, pos: VideoPos) -> Option<usize> {
        let row_to_fill = (pos.vctr >> 4) + 1;
        let first_pixel = pos.vctr & 15 == 0 && pos.hctr == 0;
        let in_grid = (0..self.timings.rows() as i32).contains(&row_to_fill);
        (first_pixel && in_grid).then_some(row_to_fill as usize)
    }

    /// Advance one clock, returning the pins driven during it
    pub fn step(&mut self) -> VgaOutput {
        // registered outputs, all sampled before the edge
        let fill_ok = self.arbiter.ok(ROWFILL_CLIENT);
        let fill_reply = self.arbiter.reply(ROWFILL_CLIENT);
        let cm_ok = self.arbiter.ok(CHARMAP_CLIENT);
        let cm_reply = self.arbiter.reply(CHARMAP_CLIENT);
        let gbuf_data = self.gbuf.read_data();
        let serial_out = self.serial.output();
        let utf8_out = self.utf8.output();
        let charmap_valid = self.charmap.valid();
        let glyphid = self.charmap.glyphid();
        let codepoint = self.termcore.codepoint();
        let core_state = self.termcore.state();
        let cursor = self.termcore.cursor();
        let pos = self.video.pos();
        let output = self.video.output();

        let fill = self.fill_request(pos);
        if let Some(row) = fill {
            self.stats.fills_started += 1;
            if !self.filler.is_idle() {
                self.stats.fill_overruns += 1;
                tracing::warn!(
                    "row {} fill requested while row {} is still filling",
                    row,
                    self.filler.char_row()
                );
            }
        }
        let fill_out = self.filler.step(RowFillInputs {
            start_fill: fill.is_some(),
            char_row: fill.unwrap_or(0),
            gbuf_data,
            ok: fill_ok,
            reply: fill_reply,
        });

        let gbuf_ack = self
            .gbuf
            .step(fill_out.gbuf, self.termcore.gbuf_write(glyphid));
        if gbuf_ack && core_state == TermCoreState::Print {
            self.stats.glyphs_printed += 1;
        }

        let core_out = self.termcore.step(TermCoreInputs {
            serial: utf8_out,
            charmap_valid,
            gbuf_ack,
        });
        if core_out.serial_ack {
            self.stats.codepoints += 1;
        }

        let byte_ack = self.utf8.step(serial_out, core_out.serial_ack);
        let line = self.host.line();
        self.host.step();
        self.serial.step(SerialInputs::rx(line, byte_ack));

        let cm_client = self.charmap.step(CharMapInputs {
            codepoint,
            en: core_out.charmap_en,
            ok: cm_ok,
            reply: cm_reply,
        });

        self.arbiter.step(&[fill_out.flash, cm_client]);

        // scan-out reads the old contents on a same-cycle write
        self.video.step(&self.rowbuf, &cursor);
        self.rowbuf.write(fill_out.rowbuf);

        self.stats.cycles += 1;
        if self.video.pos() == (VideoPos { hctr: 0, vctr: 0 }) {
            self.stats.frames += 1;
        }
        output
    }

    pub fn run_cycles(&mut self, cycles: u64) {
        for _ in 0..cycles {
            self.step();
        }
    }

    /// Clock until the terminal has printed everything queued, or
    /// `max_cycles` pass. Returns whether it settled.
    pub fn run_until_settled(&mut self, max_cycles: u64) -> bool {
        for _ in 0..max_cycles {
            if self.is_settled() {
                return true;
            }
            self.step();
        }
        self.is_settled()
    }

    /// Clock to the start of the next frame (if not already there), then
    /// one full frame, capturing its active pixels
    pub fn run_frame(&mut self) -> FrameCapture {
        let start = VideoPos { hctr: 0, vctr: 0 };
        while self.video.pos() != start {
            self.step();
        }
        let mut capture = FrameCapture::new(&self.timings);
        for _ in 0..self.timings.frame_cycles() {
            let out = self.step();
            capture.push(&out);
        }
        capture
    }
}
