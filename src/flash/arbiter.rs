//! Flash bus arbiter
//!
//! Multiplexes the single flash reader between a fixed set of clients. From
//! `Idle` the first requesting client in registration order is granted; it
//! keeps the bus, with its request fields wired straight through to the
//! reader, until it drops `request`. `ok` is a registered grant, so it is
//! never asserted in the same cycle a fresh request arrives.

use super::device::SpiDevice;
use super::reader::FlashReader;
use crate::signals::{ArbClient, FlashBus, FlashReply};

/// Arbiter state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbState {
    Idle,
    /// Bus granted to the client at this index
    Client(usize),
}

/// Arbiter owning the one physical reader
#[derive(Debug)]
pub struct FlashArbiter<D> {
    reader: FlashReader<D>,
    clients: usize,
    state: ArbState,
}

impl<D: SpiDevice> FlashArbiter<D> {
    pub fn new(reader: FlashReader<D>, clients: usize) -> Self {
        Self {
            reader,
            clients,
            state: ArbState::Idle,
        }
    }

    pub fn state(&self) -> ArbState {
        self.state
    }

    pub fn clients(&self) -> usize {
        self.clients
    }

    pub fn reader(&self) -> &FlashReader<D> {
        &self.reader
    }

    pub fn reader_mut(&mut self) -> &mut FlashReader<D> {
        &mut self.reader
    }

    /// Whether `client` currently holds the bus
    pub fn ok(&self, client: usize) -> bool {
        self.state == ArbState::Client(client)
    }

    /// Reader response as seen by `client`; zero unless granted
    pub fn reply(&self, client: usize) -> FlashReply {
        if self.ok(client) {
            self.reader.outputs()
        } else {
            FlashReply::default()
        }
    }

    /// Advance one clock. `requests` holds one slot per client, in
    /// registration order.
    pub fn step(&mut self, requests: &[ArbClient]) {
        debug_assert_eq!(requests.len(), self.clients);

        let bus = match self.state {
            ArbState::Client(i) => requests[i].bus,
            ArbState::Idle => FlashBus::default(),
        };

        self.state = match self.state {
            ArbState::Idle => match requests.iter().position(|c| c.request) {
                Some(i) => {
                    tracing::trace!("flash granted to client {}", i);
                    ArbState::Client(i)
                }
                None => ArbState::Idle,
            },
            ArbState::Client(i) if !requests[i].request => ArbState::Idle,
            granted => granted,
        };

        self.reader.step(bus);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flash::device::SpiFlash;
    use crate::flash::reader::ReaderWidth;
    use proptest::prelude::*;

    fn arbiter(clients: usize) -> FlashArbiter<SpiFlash> {
        let reader = FlashReader::new(ReaderWidth::Quad, SpiFlash::new((0..=255u8).collect()));
        FlashArbiter::new(reader, clients)
    }

    fn req(request: bool) -> ArbClient {
        ArbClient {
            request,
            ..Default::default()
        }
    }

    #[test]
    fn test_grant_is_registered() {
        let mut arb = arbiter(2);
        assert!(!arb.ok(0));
        arb.step(&[req(true), req(false)]);
        assert!(arb.ok(0));
        assert!(!arb.ok(1));
    }

    #[test]
    fn test_first_requester_wins() {
        let mut arb = arbiter(2);
        arb.step(&[req(true), req(true)]);
        assert_eq!(arb.state(), ArbState::Client(0));
    }

    #[test]
    fn test_holder_keeps_bus_until_release() {
        let mut arb = arbiter(2);
        arb.step(&[req(false), req(true)]);
        assert!(arb.ok(1));
        // client 0 now asks too but must wait
        for _ in 0..5 {
            arb.step(&[req(true), req(true)]);
            assert!(arb.ok(1));
        }
        arb.step(&[req(true), req(false)]);
        assert_eq!(arb.state(), ArbState::Idle);
        arb.step(&[req(true), req(false)]);
        assert!(arb.ok(0));
    }

    #[test]
    fn test_reply_only_for_granted_client() {
        let mut arb = arbiter(2);
        let trigger = ArbClient {
            request: true,
            bus: FlashBus {
                addr: 0x40,
                read_size: 1,
                read_trigger: true,
            },
        };
        arb.step(&[req(true), req(false)]);
        arb.step(&[trigger, req(false)]);
        let mut seen = None;
        for _ in 0..40 {
            assert!(!arb.reply(1).valid);
            if arb.reply(0).valid {
                seen = Some(arb.reply(0).data);
            }
            arb.step(&[req(true), req(false)]);
        }
        assert_eq!(seen, Some(0x40));
    }

    proptest! {
        #[test]
        fn prop_mutual_exclusion(pattern in prop::collection::vec((any::<bool>(), any::<bool>()), 1..200)) {
            let mut arb = arbiter(2);
            let mut prev = (false, false);
            for (a, b) in pattern {
                // invariant holds on the registered grant before each edge
                prop_assert!(!(arb.ok(0) && arb.ok(1)));
                if arb.ok(0) { prop_assert!(prev.0); }
                if arb.ok(1) { prop_assert!(prev.1); }
                arb.step(&[req(a), req(b)]);
                prev = (a, b);
            }
            prop_assert!(!(arb.ok(0) && arb.ok(1)));
            if arb.ok(0) { prop_assert!(prev.0); }
            if arb.ok(1) { prop_assert!(prev.1); }
        }
    }
}
