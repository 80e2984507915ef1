//! 8N1 UART line coding
//!
//! `UartRx` is the receiver inside the terminal: it watches the RX line,
//! samples each bit near its middle and hands completed bytes on. `UartTx`
//! shifts bytes out onto a line, either from the terminal's transmit FIFO
//! or, at the host end of the cable, from a queue filled by `send`.

use std::collections::VecDeque;

use crate::signals::Stream;

/// Bits per frame: start, eight data bits, stop
const FRAME_BITS: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RxState {
    Idle,
    Busy { timer: u32, bits_left: u8, shreg: u16 },
}

#[derive(Debug, Clone)]
pub struct UartRx {
    divisor: u32,
    state: RxState,
    framing_errors: u64,
}

impl UartRx {
    /// `divisor` is the number of clocks per bit
    pub fn new(divisor: u32) -> Self {
        Self {
            divisor: divisor.max(2),
            state: RxState::Idle,
            framing_errors: 0,
        }
    }

    pub fn divisor(&self) -> u32 {
        self.divisor
    }

    pub fn is_idle(&self) -> bool {
        self.state == RxState::Idle
    }

    /// Frames dropped for a bad start or stop bit
    pub fn framing_errors(&self) -> u64 {
        self.framing_errors
    }

    /// Advance one clock with the RX line level. Returns a byte on the clock
    /// its stop bit is sampled.
    pub fn step(&mut self, line: bool) -> Option<u8> {
        match self.state {
            RxState::Idle => {
                if !line {
                    self.state = RxState::Busy {
                        timer: (self.divisor - 1) / 2,
                        bits_left: FRAME_BITS,
                        shreg: 0,
                    };
                }
                None
            }
            RxState::Busy {
                timer,
                bits_left,
                shreg,
            } => {
                if timer > 0 {
                    self.state = RxState::Busy {
                        timer: timer - 1,
                        bits_left,
                        shreg,
                    };
                    return None;
                }
                let shreg = (shreg >> 1) | (u16::from(line) << (FRAME_BITS - 1));
                if bits_left > 1 {
                    self.state = RxState::Busy {
                        timer: self.divisor - 1,
                        bits_left: bits_left - 1,
                        shreg,
                    };
                    return None;
                }
                self.state = RxState::Idle;
                let start = shreg & 1;
                let stop = (shreg >> 9) & 1;
                if start == 0 && stop == 1 {
                    Some((shreg >> 1) as u8)
                } else {
                    self.framing_errors += 1;
                    tracing::debug!("uart framing error ({:#05x})", shreg);
                    None
                }
            }
        }
    }
}

/// 8N1 transmitter
#[derive(Debug, Clone)]
pub struct UartTx {
    divisor: u32,
    queue: VecDeque<u8>,
    shreg: u16,
    bits_left: u8,
    timer: u32,
}

impl UartTx {
    pub fn new(divisor: u32) -> Self {
        Self {
            divisor: divisor.max(2),
            queue: VecDeque::new(),
            shreg: 0,
            bits_left: 0,
            timer: 0,
        }
    }

    pub fn send(&mut self, bytes: &[u8]) {
        self.queue.extend(bytes);
    }

    /// Bytes not yet started
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Nothing queued and the line is back to idle
    pub fn is_idle(&self) -> bool {
        self.bits_left == 0 && self.queue.is_empty()
    }

    /// Shift register empty; a byte offered now is taken this clock
    pub fn rdy(&self) -> bool {
        self.bits_left == 0
    }

    /// Line level for the current clock; idle high
    pub fn line(&self) -> bool {
        self.bits_left == 0 || self.shreg & 1 != 0
    }

    /// Clocks needed to shift out one byte
    pub fn byte_cycles(&self) -> u64 {
        u64::from(self.divisor) * u64::from(FRAME_BITS) + 1
    }

    /// Advance one clock, starting the next queued byte when the line is free
    pub fn step(&mut self) {
        let next = if self.rdy() { self.queue.pop_front() } else { None };
        self.clock(next);
    }

    /// Advance one clock, taking a byte from `input` when the line is free.
    /// Returns the input `ack`.
    pub fn step_stream(&mut self, input: Stream<u8>) -> bool {
        self.clock(input.rdy.then_some(input.data))
    }

    fn clock(&mut self, next: Option<u8>) -> bool {
        if self.bits_left == 0 {
            match next {
                Some(byte) => {
                    self.shreg = (1 << 9) | (u16::from(byte) << 1);
                    self.bits_left = FRAME_BITS;
                    self.timer = self.divisor - 1;
                    true
                }
                None => false,
            }
        } else {
            if self.timer == 0 {
                self.shreg >>= 1;
                self.bits_left -= 1;
                self.timer = self.divisor - 1;
            } else {
                self.timer -= 1;
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback(divisor: u32, bytes: &[u8]) -> (Vec<u8>, UartRx) {
        let mut tx = UartTx::new(divisor);
        let mut rx = UartRx::new(divisor);
        tx.send(bytes);
        let mut got = Vec::new();
        let budget = tx.byte_cycles() * (bytes.len() as u64 + 1);
        for _ in 0..budget {
            if let Some(b) = rx.step(tx.line()) {
                got.push(b);
            }
            tx.step();
        }
        (got, rx)
    }

    #[test]
    fn test_loopback() {
        let data = [0x00, 0x41, 0xFF, 0xC3, 0x55];
        let (got, rx) = loopback(16, &data);
        assert_eq!(got, data);
        assert_eq!(rx.framing_errors(), 0);
        assert!(rx.is_idle());
    }

    #[test]
    fn test_loopback_real_divisor() {
        // 25.175 MHz / 115200
        let (got, _) = loopback(218, b"hi");
        assert_eq!(got, b"hi");
    }

    #[test]
    fn test_tx_idles_high() {
        let mut tx = UartTx::new(4);
        assert!(tx.line());
        tx.send(&[0xFF]);
        tx.step();
        assert!(!tx.line(), "start bit");
        for _ in 0..4 {
            tx.step();
        }
        assert!(tx.line());
        assert_eq!(tx.pending(), 0);
    }

    #[test]
    fn test_stream_input_waits_for_free_line() {
        let mut tx = UartTx::new(4);
        assert!(tx.rdy());
        assert!(tx.step_stream(Stream::ready(0x5A)));
        assert!(!tx.rdy());
        for _ in 0..(tx.byte_cycles() - 1) {
            assert!(!tx.step_stream(Stream::ready(0xA5)));
        }
        assert!(tx.rdy());
        assert!(!tx.step_stream(Stream::default()));
        assert!(tx.line());
    }

    #[test]
    fn test_break_is_framing_error() {
        let mut rx = UartRx::new(8);
        let mut got = None;
        for _ in 0..200 {
            got = got.or(rx.step(false));
        }
        assert_eq!(got, None);
        assert!(rx.framing_errors() >= 1);
    }
}
