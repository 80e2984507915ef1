//! Codepoint to glyph id lookup
//!
//! Every lookup is a two-byte flash read from a flat table indexed by the low
//! 16 bits of the codepoint. Codepoints above the BMP alias onto it.

use crate::flash::FlashLayout;
use crate::signals::{ArbClient, FlashBus, FlashReply};

/// Lookup state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharMapState {
    Idle,
    /// Waiting for the arbiter
    Request,
    /// Waiting for the low byte
    Wait1,
    /// Waiting for the high byte
    Wait2,
    /// `valid` is high for this one cycle
    Done,
}

/// Inputs sampled each cycle
#[derive(Debug, Clone, Copy, Default)]
pub struct CharMapInputs {
    /// Codepoint register of the consumer
    pub codepoint: u32,
    /// Start pulse
    pub en: bool,
    /// Arbiter grant
    pub ok: bool,
    /// Reader response, valid only while granted
    pub reply: FlashReply,
}

#[derive(Debug, Clone)]
pub struct CharMap {
    layout: FlashLayout,
    state: CharMapState,
    request: bool,
    glyphid: u16,
    valid: bool,
}

impl CharMap {
    pub fn new(layout: FlashLayout) -> Self {
        Self {
            layout,
            state: CharMapState::Idle,
            request: false,
            glyphid: 0,
            valid: false,
        }
    }

    pub fn state(&self) -> CharMapState {
        self.state
    }

    /// Last resolved glyph id
    pub fn glyphid(&self) -> u16 {
        self.glyphid
    }

    /// High for exactly one cycle after a lookup completes
    pub fn valid(&self) -> bool {
        self.valid
    }

    pub fn is_idle(&self) -> bool {
        self.state == CharMapState::Idle
    }

    /// Advance one clock, returning the arbiter client slot for this cycle
    pub fn step(&mut self, inputs: CharMapInputs) -> ArbClient {
        let mut bus = FlashBus {
            addr: self.layout.charmap_addr(inputs.codepoint),
            read_size: 2,
            read_trigger: false,
        };
        let request = self.request;

        match self.state {
            CharMapState::Idle => {
                if inputs.en {
                    self.request = true;
                    self.state = CharMapState::Request;
                }
            }
            CharMapState::Request => {
                if inputs.ok {
                    bus.read_trigger = true;
                    self.state = CharMapState::Wait1;
                }
            }
            CharMapState::Wait1 => {
                if inputs.reply.valid {
                    self.glyphid = (self.glyphid & 0xFF00) | u16::from(inputs.reply.data);
                    self.state = CharMapState::Wait2;
                }
            }
            CharMapState::Wait2 => {
                if inputs.reply.valid {
                    self.glyphid = (self.glyphid & 0x00FF) | (u16::from(inputs.reply.data) << 8);
                    self.valid = true;
                    self.request = false;
                    self.state = CharMapState::Done;
                }
            }
            CharMapState::Done => {
                self.valid = false;
                self.state = CharMapState::Idle;
            }
        }

        ArbClient { request, bus }
    }
}
