//! Insertion Order Module
//!
//! Tracks entry creation order for oldest-first eviction.

use std::collections::{BTreeMap, HashMap};

use super::key::CacheKey;

/// Position of a key: creation time, then a tie-breaking sequence number.
type Position = (u64, u64);

// == Insertion Order ==
/// Orders keys by `created_at`, ties broken by insertion sequence.
///
/// Reads never touch the order, so eviction is oldest-created rather than
/// least-recently-used. Finding and removing the oldest key is O(log n).
#[derive(Debug, Default)]
pub struct InsertionOrder {
    /// Keys by position, front = oldest
    order: BTreeMap<Position, CacheKey>,
    /// Reverse lookup for removals
    positions: HashMap<CacheKey, Position>,
    next_seq: u64,
}

impl InsertionOrder {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Insert ==
    /// Records `key` as created at `created_at`, replacing any earlier position.
    pub fn insert(&mut self, key: &CacheKey, created_at: u64) {
        self.remove(key);
        let position = (created_at, self.next_seq);
        self.next_seq += 1;
        self.order.insert(position, key.clone());
        self.positions.insert(key.clone(), position);
    }

    // == Remove ==
    /// Stops tracking `key`. Returns whether it was tracked.
    pub fn remove(&mut self, key: &CacheKey) -> bool {
        match self.positions.remove(key) {
            Some(position) => {
                self.order.remove(&position);
                true
            }
            None => false,
        }
    }

    // == Peek Oldest ==
    pub fn peek_oldest(&self) -> Option<&CacheKey> {
        self.order.values().next()
    }

    /// Keys from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &CacheKey> {
        self.order.values()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.positions.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.positions.clear();
    }
}
