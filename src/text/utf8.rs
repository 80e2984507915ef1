//! Streaming UTF-8 decoder
//!
//! Bytes come in over a rdy/ack stream and 21-bit codepoints go out over
//! another. Invalid sequences are dropped without any output and the decoder
//! resynchronises on the next byte:
//!
//! - invalid lead bytes (stray continuations, 0xF5..=0xFF)
//! - the overlong two-byte leads 0xC0 and 0xC1, rejected immediately
//! - a non-continuation byte where a continuation was expected (that byte is
//!   consumed and lost)
//! - overlong three- and four-byte forms, rejected as soon as the
//!   accumulated high bits show the value fits in fewer bytes
//!
//! Surrogates and noncharacters are passed through; they are not errors at
//! this level.

use crate::signals::Stream;

/// Decoder state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utf8State {
    /// Waiting for a lead byte
    Idle,
    /// Classifying the lead byte
    Initial,
    /// Three continuation bytes still to come
    Cont3,
    /// Two continuation bytes still to come
    Cont2,
    /// Last continuation byte
    Cont1,
    /// Codepoint held on the output until acknowledged
    Done,
}

#[derive(Debug, Clone)]
pub struct Utf8Decoder {
    state: Utf8State,
    /// Byte taken on the last handshake
    received: u8,
    /// Codepoint being assembled
    codepoint: u32,
    /// Continuation bytes the lead byte announced
    bytecount: u8,
}

impl Default for Utf8Decoder {
    fn default() -> Self {
        Self::new()
    }
}

fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self {
            state: Utf8State::Idle,
            received: 0,
            codepoint: 0,
            bytecount: 0,
        }
    }

    pub fn state(&self) -> Utf8State {
        self.state
    }

    /// Output stream: a codepoint is offered while in `Done`
    pub fn output(&self) -> Stream<u32> {
        Stream {
            data: self.codepoint,
            rdy: self.state == Utf8State::Done,
        }
    }

    /// Take the input byte if one is offered and move to `next`.
    /// Returns the input `ack`.
    fn read_and_next(&mut self, input: Stream<u8>, next: Utf8State) -> bool {
        if input.rdy {
            self.received = input.data;
            self.state = next;
        }
        input.rdy
    }

    /// Advance one clock. `input` is the byte stream offered this cycle and
    /// `out_ack` the consumer's acknowledgement of the current output.
    /// Returns the input acknowledgement.
    pub fn step(&mut self, input: Stream<u8>, out_ack: bool) -> bool {
        let byte = self.received;
        match self.state {
            Utf8State::Idle => self.read_and_next(input, Utf8State::Initial),
            Utf8State::Initial => match byte {
                0x00..=0x7F => {
                    self.codepoint = u32::from(byte);
                    self.state = Utf8State::Done;
                    false
                }
                0xC0 | 0xC1 => {
                    self.state = Utf8State::Idle;
                    false
                }
                0xC2..=0xDF => {
                    self.codepoint = u32::from(byte & 0x1F) << 6;
                    self.bytecount = 1;
                    self.read_and_next(input, Utf8State::Cont1)
                }
                0xE0..=0xEF => {
                    self.codepoint = u32::from(byte & 0x0F) << 12;
                    self.bytecount = 2;
                    self.read_and_next(input, Utf8State::Cont2)
                }
                0xF0..=0xF4 => {
                    self.codepoint = u32::from(byte & 0x07) << 18;
                    self.bytecount = 3;
                    self.read_and_next(input, Utf8State::Cont3)
                }
                _ => {
                    self.state = Utf8State::Idle;
                    false
                }
            },
            Utf8State::Cont3 => {
                if is_continuation(byte) {
                    self.codepoint =
                        (self.codepoint & !0x3_F000) | (u32::from(byte & 0x3F) << 12);
                    self.read_and_next(input, Utf8State::Cont2)
                } else {
                    self.state = Utf8State::Idle;
                    false
                }
            }
            Utf8State::Cont2 => {
                // four-byte forms below U+10000 are overlong
                let overlong = self.bytecount == 3 && self.codepoint >> 16 == 0;
                if is_continuation(byte) && !overlong {
                    self.codepoint = (self.codepoint & !0xFC0) | (u32::from(byte & 0x3F) << 6);
                    self.read_and_next(input, Utf8State::Cont1)
                } else {
                    self.state = Utf8State::Idle;
                    false
                }
            }
            Utf8State::Cont1 => {
                // three-byte forms below U+0800 are overlong
                let overlong = self.bytecount == 2 && (self.codepoint >> 11) & 0x1F == 0;
                if is_continuation(byte) && !overlong {
                    self.codepoint = (self.codepoint & !0x3F) | u32::from(byte & 0x3F);
                    self.state = Utf8State::Done;
                } else {
                    self.state = Utf8State::Idle;
                }
                false
            }
            Utf8State::Done => {
                if out_ack {
                    self.state = Utf8State::Idle;
                }
                false
            }
        }
    }

    /// Run a whole byte slice through the decoder with an always-ready
    /// producer and an always-acknowledging consumer, collecting codepoints.
    pub fn decode_stream(&mut self, bytes: &[u8]) -> Vec<u32> {
        let mut out = Vec::new();
        let mut pos = 0;
        loop {
            let input = match bytes.get(pos) {
                Some(&b) => Stream::ready(b),
                None => Stream::default(),
            };
            let output = self.output();
            if output.rdy {
                out.push(output.data);
            }
            let before = self.state;
            if self.step(input, output.rdy) {
                pos += 1;
            }
            // out of input and stalled: a partial sequence stays pending
            if !input.rdy && self.state == before && before != Utf8State::Done {
                return out;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn decode(bytes: &[u8]) -> Vec<u32> {
        Utf8Decoder::new().decode_stream(bytes)
    }

    #[test]
    fn test_ascii() {
        assert_eq!(decode(b"Az0"), vec![0x41, 0x7A, 0x30]);
    }

    #[test]
    fn test_two_byte() {
        // U+00E9
        assert_eq!(decode(&[0xC3, 0xA9]), vec![0xE9]);
    }

    #[test]
    fn test_three_byte() {
        // U+4E2D
        assert_eq!(decode(&[0xE4, 0xB8, 0xAD]), vec![0x4E2D]);
    }

    #[test]
    fn test_four_byte() {
        // U+1F600
        assert_eq!(decode(&[0xF0, 0x9F, 0x98, 0x80]), vec![0x1F600]);
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(decode(&[0xC2, 0x80]), vec![0x80]);
        assert_eq!(decode(&[0xDF, 0xBF]), vec![0x7FF]);
        assert_eq!(decode(&[0xE0, 0xA0, 0x80]), vec![0x800]);
        assert_eq!(decode(&[0xEF, 0xBF, 0xBF]), vec![0xFFFF]);
        assert_eq!(decode(&[0xF0, 0x90, 0x80, 0x80]), vec![0x10000]);
        assert_eq!(decode(&[0xF4, 0x8F, 0xBF, 0xBF]), vec![0x10FFFF]);
    }

    #[test]
    fn test_overlong_two_byte_lead_rejected_at_once() {
        let mut decoder = Utf8Decoder::new();
        decoder.step(Stream::ready(0xC1), false);
        assert_eq!(decoder.state(), Utf8State::Initial);
        // the decoder must not take another byte before giving up
        assert!(!decoder.step(Stream::ready(0x81), false));
        assert_eq!(decoder.state(), Utf8State::Idle);
        assert_eq!(decode(&[0xC0, 0x80, b'A']), vec![0x41]);
    }

    #[test]
    fn test_overlong_three_byte() {
        // U+002F as E0 80 AF
        assert_eq!(decode(&[0xE0, 0x80, 0xAF]), Vec::<u32>::new());
        // U+07FF as E0 9F BF
        assert_eq!(decode(&[0xE0, 0x9F, 0xBF, b'x']), vec![0x78]);
    }

    #[test]
    fn test_overlong_four_byte() {
        // U+FFFF as F0 8F BF BF
        assert_eq!(decode(&[0xF0, 0x8F, 0xBF, 0xBF, b'y']), vec![0x79]);
    }

    #[test]
    fn test_invalid_leads() {
        for lead in [0x80u8, 0xBF, 0xF5, 0xF8, 0xFE, 0xFF] {
            assert_eq!(decode(&[lead, b'A']), vec![0x41], "lead {:#04x}", lead);
        }
    }

    #[test]
    fn test_bad_continuation_is_swallowed() {
        // 'A' arrives where a continuation byte was expected and is lost
        assert_eq!(decode(&[0xC3, b'A', b'B']), vec![0x42]);
    }

    #[test]
    fn test_output_held_until_ack() {
        let mut decoder = Utf8Decoder::new();
        decoder.step(Stream::ready(b'q'), false);
        decoder.step(Stream::default(), false);
        for _ in 0..5 {
            assert_eq!(decoder.output(), Stream::ready(0x71));
            assert!(!decoder.step(Stream::ready(b'r'), false));
        }
        decoder.step(Stream::default(), true);
        assert_eq!(decoder.state(), Utf8State::Idle);
    }

    #[test]
    fn test_surrogates_pass_through() {
        assert_eq!(decode(&[0xED, 0xA0, 0x80]), vec![0xD800]);
    }

    proptest! {
        #[test]
        fn prop_valid_scalars_round_trip(c in any::<char>()) {
            let mut buf = [0u8; 4];
            let bytes = c.encode_utf8(&mut buf).as_bytes();
            prop_assert_eq!(decode(bytes), vec![c as u32]);
        }

        #[test]
        fn prop_valid_strings_decode_exactly(s in "\\PC{0,32}") {
            let expected: Vec<u32> = s.chars().map(|c| c as u32).collect();
            prop_assert_eq!(decode(s.as_bytes()), expected);
        }

        #[test]
        fn prop_garbage_stays_below_lead_bound(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
            // leads stop at 0xF4, which bounds every decoded value
            for cp in decode(&bytes) {
                prop_assert!(cp < 0x14_0000);
            }
        }

        #[test]
        fn prop_overlong_three_byte_emits_nothing(cp in 0u32..0x800) {
            let bytes = [
                0xE0 | (cp >> 12) as u8,
                0x80 | ((cp >> 6) & 0x3F) as u8,
                0x80 | (cp & 0x3F) as u8,
            ];
            prop_assert_eq!(decode(&bytes), Vec::<u32>::new());
            let mut tail = bytes.to_vec();
            tail.push(b'A');
            prop_assert_eq!(decode(&tail), vec![0x41]);
        }

        #[test]
        fn prop_overlong_four_byte_emits_nothing(cp in 0u32..0x10000) {
            let bytes = [
                0xF0 | (cp >> 18) as u8,
                0x80 | ((cp >> 12) & 0x3F) as u8,
                0x80 | ((cp >> 6) & 0x3F) as u8,
                0x80 | (cp & 0x3F) as u8,
            ];
            prop_assert_eq!(decode(&bytes), Vec::<u32>::new());
            let mut tail = bytes.to_vec();
            tail.push(b'A');
            prop_assert_eq!(decode(&tail), vec![0x41]);
        }

        #[test]
        fn prop_invalid_lead_idles_within_one_byte(
            lead in prop_oneof![Just(0xC0u8), Just(0xC1u8), 0xF5u8..=0xFF],
            next in any::<u8>(),
        ) {
            let mut decoder = Utf8Decoder::new();
            prop_assert!(decoder.step(Stream::ready(lead), false));
            prop_assert_eq!(decoder.state(), Utf8State::Initial);
            prop_assert!(!decoder.step(Stream::ready(next), false));
            prop_assert_eq!(decoder.state(), Utf8State::Idle);
            prop_assert!(!decoder.output().rdy);
        }

        #[test]
        fn prop_resyncs_after_garbage(bytes in prop::collection::vec(0x80u8..=0xFF, 0..16)) {
            // a run of non-ASCII garbage followed by two ASCII bytes always
            // yields at least the final ASCII byte
            let mut input = bytes.clone();
            input.extend_from_slice(b"AZ");
            let out = decode(&input);
            prop_assert_eq!(out.last().copied(), Some(0x5A));
        }
    }
}
