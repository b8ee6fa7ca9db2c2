//! Expiry Queue Module
//!
//! Min-heap of pending expirations drained by a single sweep task.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

// == Expiry Queue ==
/// Tracks scheduled expirations ordered by deadline.
///
/// Items are never removed on reschedule. Each carries the generation it was
/// scheduled with, and the owner discards items whose generation no longer
/// matches the live entry.
#[derive(Debug, Default)]
pub struct ExpiryQueue {
    /// (expires_at_ms, generation, key), earliest deadline on top
    heap: BinaryHeap<Reverse<(u64, u64, String)>>,
}

impl ExpiryQueue {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    // == Schedule ==
    /// Records that `key` at `generation` expires at `expires_at`.
    ///
    /// Returns true when this deadline became the earliest one, meaning a
    /// sleeping sweeper must be woken.
    pub fn schedule(&mut self, key: &str, expires_at: u64, generation: u64) -> bool {
        let becomes_head = self
            .next_deadline()
            .map_or(true, |current| expires_at < current);
        self.heap
            .push(Reverse((expires_at, generation, key.to_string())));
        becomes_head
    }

    // == Pop Due ==
    /// Removes and returns the earliest item if its deadline has passed.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(String, u64)> {
        match self.heap.peek() {
            Some(Reverse((expires_at, _, _))) if *expires_at <= now_ms => self
                .heap
                .pop()
                .map(|Reverse((_, generation, key))| (key, generation)),
            _ => None,
        }
    }

    // == Next Deadline ==
    /// Earliest scheduled deadline, stale or not.
    pub fn next_deadline(&self) -> Option<u64> {
        self.heap.peek().map(|Reverse((expires_at, _, _))| *expires_at)
    }

    // == Compact ==
    /// Drops every item for which `is_live` returns false.
    pub fn retain<F>(&mut self, mut is_live: F)
    where
        F: FnMut(&str, u64) -> bool,
    {
        let items = std::mem::take(&mut self.heap).into_vec();
        self.heap = items
            .into_iter()
            .filter(|Reverse((_, generation, key))| is_live(key, *generation))
            .collect();
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
