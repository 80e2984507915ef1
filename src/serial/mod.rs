//! Serial front end
//!
//! A UART with a small FIFO on each side. Received bytes come out as a
//! rdy/ack stream for the UTF-8 decoder; bytes written to the transmit
//! stream are queued and shifted out on the TX line. The host side of the
//! link lives here too.

mod fifo;
mod uart;

pub use fifo::SyncFifo;
pub use uart::{UartRx, UartTx};

use crate::signals::Stream;

/// Standard line rate
pub const BAUD: u32 = 115_200;

/// Receive FIFO depth
pub const RX_DEPTH: usize = 16;

/// Transmit FIFO depth
pub const TX_DEPTH: usize = 16;

/// Inputs sampled by [`BufSerial::step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialInputs {
    /// RX line level
    pub line: bool,
    /// Consumer ack of the receive stream
    pub ack: bool,
    /// Bytes offered for transmission; taken when `tx_rdy` is high
    pub tx: Stream<u8>,
}

impl SerialInputs {
    /// Receive only, nothing to send
    pub fn rx(line: bool, ack: bool) -> Self {
        Self {
            line,
            ack,
            tx: Stream::default(),
        }
    }
}

/// UART with receive and transmit FIFOs
#[derive(Debug, Clone)]
pub struct BufSerial {
    rx: UartRx,
    rx_fifo: SyncFifo<u8>,
    tx: UartTx,
    tx_fifo: SyncFifo<u8>,
    received: u64,
    sent: u64,
    overflows: u64,
}

impl BufSerial {
    pub fn new(divisor: u32) -> Self {
        Self {
            rx: UartRx::new(divisor),
            rx_fifo: SyncFifo::new(RX_DEPTH),
            tx: UartTx::new(divisor),
            tx_fifo: SyncFifo::new(TX_DEPTH),
            received: 0,
            sent: 0,
            overflows: 0,
        }
    }

    /// Received byte stream
    pub fn output(&self) -> Stream<u8> {
        self.rx_fifo.head()
    }

    /// Room in the transmit FIFO; the `rdy` of the transmit stream
    pub fn tx_rdy(&self) -> bool {
        self.tx_fifo.w_rdy()
    }

    /// TX line level
    pub fn tx_line(&self) -> bool {
        self.tx.line()
    }

    /// Transmit FIFO drained and the last frame fully shifted out
    pub fn tx_idle(&self) -> bool {
        self.tx.rdy() && !self.tx_fifo.head().rdy
    }

    pub fn rx(&self) -> &UartRx {
        &self.rx
    }

    /// Bytes waiting in the receive FIFO
    pub fn level(&self) -> usize {
        self.rx_fifo.level()
    }

    /// Bytes waiting in the transmit FIFO
    pub fn tx_level(&self) -> usize {
        self.tx_fifo.level()
    }

    /// Bytes taken off the line
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Bytes started on the TX line
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Bytes lost to a full receive FIFO
    pub fn overflows(&self) -> u64 {
        self.overflows
    }

    /// Advance one clock. Returns the ack of the transmit stream.
    pub fn step(&mut self, inputs: SerialInputs) -> bool {
        let byte = self.rx.step(inputs.line);
        if byte.is_some() {
            self.received += 1;
        }
        let ack = inputs.ack && self.rx_fifo.head().rdy;
        if !self.rx_fifo.step(byte, ack) && byte.is_some() {
            self.overflows += 1;
            tracing::warn!("serial rx overflow, byte dropped");
        }

        // the FIFO head is popped on the clock the transmitter takes it
        let head = self.tx_fifo.head();
        let taken = self.tx.step_stream(head);
        if taken {
            self.sent += 1;
        }
        let write = inputs.tx.rdy.then_some(inputs.tx.data);
        self.tx_fifo.step(write, taken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_reach_stream() {
        let mut tx = UartTx::new(8);
        let mut serial = BufSerial::new(8);
        tx.send(b"ok");
        for _ in 0..(tx.byte_cycles() * 3) {
            serial.step(SerialInputs::rx(tx.line(), false));
            tx.step();
        }
        assert_eq!(serial.level(), 2);
        assert_eq!(serial.output(), Stream::ready(b'o'));
        serial.step(SerialInputs::rx(true, true));
        assert_eq!(serial.output(), Stream::ready(b'k'));
        assert_eq!(serial.received(), 2);
    }

    #[test]
    fn test_overflow_drops_newest() {
        let mut tx = UartTx::new(4);
        let mut serial = BufSerial::new(4);
        let data: Vec<u8> = (0..20).collect();
        tx.send(&data);
        for _ in 0..(tx.byte_cycles() * 21) {
            serial.step(SerialInputs::rx(tx.line(), false));
            tx.step();
        }
        assert_eq!(serial.level(), RX_DEPTH);
        assert_eq!(serial.overflows(), 4);
        assert_eq!(serial.output(), Stream::ready(0));
    }

    #[test]
    fn test_tx_fifo_loops_back_to_rx() {
        let mut serial = BufSerial::new(8);
        let message = b"loop";
        let mut offered = message.iter().copied().peekable();
        let mut got = Vec::new();
        for _ in 0..(8 * 10 + 1) * 6 {
            let tx = offered.peek().map_or(Stream::default(), |&b| Stream::ready(b));
            let line = serial.tx_line();
            let rx = serial.output();
            if serial.step(SerialInputs { line, ack: rx.rdy, tx }) {
                offered.next();
            }
            if rx.rdy {
                got.push(rx.data);
            }
        }
        assert_eq!(got, message);
        assert_eq!(serial.sent(), 4);
        assert_eq!(serial.received(), 4);
        assert!(serial.tx_idle());
    }

    #[test]
    fn test_tx_backpressure_when_full() {
        let mut serial = BufSerial::new(8);
        let mut accepted = 0;
        for b in 0..(TX_DEPTH as u8 + 4) {
            if serial.step(SerialInputs {
                line: true,
                ack: false,
                tx: Stream::ready(b),
            }) {
                accepted += 1;
            }
        }
        // one byte went straight into the shift register
        assert_eq!(accepted, TX_DEPTH + 1);
        assert_eq!(serial.tx_level(), TX_DEPTH);
        assert!(!serial.tx_rdy());
        assert_eq!(serial.sent(), 1);
    }
}
