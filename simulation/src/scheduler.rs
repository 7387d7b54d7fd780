//! Deterministic event queue
//!
//! A min-heap keyed by `(at, seq)`. Sequence numbers are assigned in
//! scheduling order, so events due at the same tick pop in the order they
//! were scheduled. This makes every directed link FIFO and every run with
//! the same inputs replay identically.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hopnet_core::VirtualTime;

/// An event waiting in the queue
#[derive(Debug, Clone)]
pub struct Scheduled<T> {
    pub at: VirtualTime,
    pub seq: u64,
    pub payload: T,
}

impl<T> PartialEq for Scheduled<T> {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl<T> Eq for Scheduled<T> {}

impl<T> PartialOrd for Scheduled<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Reversed so the max-heap pops the earliest event
impl<T> Ord for Scheduled<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.at, other.seq).cmp(&(self.at, self.seq))
    }
}

/// Min-heap of pending events
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    queue: BinaryHeap<Scheduled<T>>,
    next_seq: u64,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Schedule `payload` at `at`, returning its sequence number
    pub fn schedule(&mut self, at: VirtualTime, payload: T) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Scheduled { at, seq, payload });
        seq
    }

    /// Pop the next event (earliest time, lowest sequence)
    pub fn pop_next(&mut self) -> Option<Scheduled<T>> {
        self.queue.pop()
    }

    /// Time of the next event, if any
    pub fn peek_time(&self) -> Option<VirtualTime> {
        self.queue.peek().map(|event| event.at)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
