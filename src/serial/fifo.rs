//! Synchronous FIFO with a fall-through read port

use std::collections::VecDeque;

use crate::signals::Stream;

#[derive(Debug, Clone)]
pub struct SyncFifo<T> {
    depth: usize,
    items: VecDeque<T>,
}

impl<T: Copy + Default> SyncFifo<T> {
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            items: VecDeque::with_capacity(depth),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn level(&self) -> usize {
        self.items.len()
    }

    /// Room for a write this cycle
    pub fn w_rdy(&self) -> bool {
        self.items.len() < self.depth
    }

    /// Head of the queue, valid while `rdy`
    pub fn head(&self) -> Stream<T> {
        match self.items.front() {
            Some(&data) => Stream::ready(data),
            None => Stream::default(),
        }
    }

    /// Advance one clock. Returns whether the write was accepted.
    pub fn step(&mut self, write: Option<T>, r_en: bool) -> bool {
        let accepted = write.is_some() && self.w_rdy();
        if r_en {
            self.items.pop_front();
        }
        if let (true, Some(data)) = (accepted, write) {
            self.items.push_back(data);
        }
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_and_fall_through() {
        let mut fifo = SyncFifo::new(4);
        assert!(!fifo.head().rdy);
        fifo.step(Some(1u8), false);
        assert_eq!(fifo.head(), Stream::ready(1));
        fifo.step(Some(2), true);
        assert_eq!(fifo.head(), Stream::ready(2));
        fifo.step(None, true);
        assert!(!fifo.head().rdy);
    }

    #[test]
    fn test_full_rejects_even_when_reading() {
        let mut fifo = SyncFifo::new(2);
        assert!(fifo.step(Some(1u8), false));
        assert!(fifo.step(Some(2), false));
        assert!(!fifo.step(Some(3), true));
        assert_eq!(fifo.level(), 1);
        assert_eq!(fifo.head(), Stream::ready(2));
    }
}
