//! Deadline-ordered event queue.
//!
//! A machine owns one scheduler and drains it as virtual time advances.
//! Events carry no behaviour; the owner matches on them.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::Ticks;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Entry<E> {
    at: Ticks,
    seq: u64,
    event: E,
}

/// Queue of events keyed by tick deadline.
///
/// Events with the same deadline come out in the order they were scheduled.
#[derive(Debug, Clone)]
pub struct Scheduler<E: Ord> {
    heap: BinaryHeap<Reverse<Entry<E>>>,
    next_seq: u64,
}

impl<E: Ord> Scheduler<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Queue `event` to fire at `at`.
    pub fn schedule(&mut self, at: Ticks, event: E) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Entry { at, seq, event }));
    }

    /// Remove the earliest event due at or before `now`.
    pub fn pop_due(&mut self, now: Ticks) -> Option<(Ticks, E)> {
        if self.heap.peek().is_some_and(|Reverse(e)| e.at <= now) {
            self.heap.pop().map(|Reverse(e)| (e.at, e.event))
        } else {
            None
        }
    }

    /// Deadline of the earliest pending event.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Ticks> {
        self.heap.peek().map(|Reverse(e)| e.at)
    }

    /// Drop every pending event matching `pred`. Returns how many were removed.
    pub fn cancel(&mut self, mut pred: impl FnMut(&E) -> bool) -> usize {
        let before = self.heap.len();
        self.heap.retain(|Reverse(e)| !pred(&e.event));
        before - self.heap.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<E: Ord> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}
