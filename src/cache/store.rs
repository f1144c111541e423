//! Entry Store Module
//!
//! Authoritative `key -> (value, metadata)` map, kept consistent with the
//! insertion order and the tag index on every mutation.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::cache::{
    CacheEntry, CacheKey, CacheStats, EntryMetadata, EventKind, EventLog, InsertionOrder,
    StatsEvent, TagIndex, EVENT_LOG_CAPACITY,
};

// == Lookup ==
/// Outcome of [`EntryStore::get`].
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Hit(Value),
    /// No entry under the key
    Miss,
    /// The entry had expired and was removed by this lookup
    Expired,
}

impl Lookup {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Lookup::Hit(value) => Some(value),
            Lookup::Miss | Lookup::Expired => None,
        }
    }
}

// == Entry Store ==
/// Bounded entry storage with TTL and oldest-first eviction.
///
/// The store holds no clock; callers pass `now` in Unix milliseconds.
#[derive(Debug)]
pub struct EntryStore {
    /// Values joined with their metadata
    entries: HashMap<CacheKey, CacheEntry>,
    /// Creation order for eviction
    order: InsertionOrder,
    /// Reverse tag index
    tags: TagIndex,
    stats: CacheStats,
    events: EventLog,
    /// Maximum number of entries allowed
    max_cache_size: usize,
}

impl EntryStore {
    // == Constructor ==
    /// Creates an empty store holding at most `max_cache_size` entries.
    pub fn new(max_cache_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            tags: TagIndex::new(),
            stats: CacheStats::new(),
            events: EventLog::with_capacity(EVENT_LOG_CAPACITY),
            max_cache_size: max_cache_size.max(1),
        }
    }

    // == Get ==
    /// Looks up `key`, removing it if it has expired.
    ///
    /// Every call counts as a hit or a miss and is appended to the event log.
    pub fn get(&mut self, key: &CacheKey, url: &str, now: u64) -> Lookup {
        let lookup = match self.entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                self.remove_entry(key);
                self.stats.record_expirations(1);
                Lookup::Expired
            }
            Some(entry) => Lookup::Hit(entry.value.clone()),
            None => Lookup::Miss,
        };

        let kind = match lookup {
            Lookup::Hit(_) => {
                self.stats.record_hit();
                EventKind::Hit
            }
            Lookup::Miss | Lookup::Expired => {
                self.stats.record_miss();
                EventKind::Miss
            }
        };
        debug!(key = %key, url, ?kind, "Cache lookup");
        self.events.push(StatsEvent {
            kind,
            key: key.clone(),
            url: url.to_string(),
            hit_count: self.stats.hits,
            miss_count: self.stats.misses,
            timestamp: now,
        });

        lookup
    }

    // == Set ==
    /// Inserts or overwrites `key`.
    ///
    /// At capacity the entry with the smallest `created_at` is evicted
    /// first, even when `key` is already present. Returns the evicted key,
    /// if any.
    pub fn set(&mut self, key: CacheKey, value: Value, meta: EntryMetadata) -> Option<CacheKey> {
        let evicted = if self.entries.len() >= self.max_cache_size {
            self.evict_oldest()
        } else {
            None
        };

        if let Some(previous) = self.entries.remove(&key) {
            self.tags.remove(&key, &previous.meta.tags);
        }

        self.order.insert(&key, meta.created_at);
        self.tags.insert(&key, &meta.tags);
        self.entries.insert(key, CacheEntry::new(value, meta));

        evicted
    }

    // == Delete ==
    /// Removes `key`. Returns whether an entry was present.
    pub fn delete(&mut self, key: &CacheKey) -> bool {
        self.remove_entry(key).is_some()
    }

    // == Clear ==
    /// Removes every entry. Returns how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.order.clear();
        self.tags.clear();
        count
    }

    // == Sweep Expired ==
    /// Removes all entries with `expires_at < now`, read or not.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self, now: u64) -> usize {
        let expired: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        let count = self.remove_keys(&expired);
        self.stats.record_expirations(count);
        count
    }

    // == Restore ==
    /// Puts back an entry read from persistence, without counting it as a
    /// write or evicting. Call [`trim_to_capacity`](Self::trim_to_capacity)
    /// once restoring is done.
    pub fn restore(&mut self, key: CacheKey, entry: CacheEntry) {
        if let Some(previous) = self.entries.remove(&key) {
            self.tags.remove(&key, &previous.meta.tags);
        }
        let meta = entry.meta.normalized();
        self.order.insert(&key, meta.created_at);
        self.tags.insert(&key, &meta.tags);
        self.entries.insert(key, CacheEntry::new(entry.value, meta));
    }

    /// Evicts oldest entries until the size bound holds. Returns how many.
    pub fn trim_to_capacity(&mut self) -> usize {
        let mut trimmed = 0;
        while self.entries.len() > self.max_cache_size {
            if self.evict_oldest().is_none() {
                break;
            }
            trimmed += 1;
        }
        trimmed
    }

    // == Accessors ==
    /// Entry under `key` without touching stats or expiry.
    pub fn peek(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = (&CacheKey, &CacheEntry)> {
        self.order
            .iter()
            .filter_map(move |key| self.entries.get(key).map(|entry| (key, entry)))
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Recent hit/miss events, oldest first.
    pub fn events(&self) -> Vec<StatsEvent> {
        self.events.snapshot()
    }

    pub fn max_cache_size(&self) -> usize {
        self.max_cache_size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn tag_index(&self) -> &TagIndex {
        &self.tags
    }

    /// Removes each of `keys`. Returns how many were present.
    pub(crate) fn remove_keys(&mut self, keys: &[CacheKey]) -> usize {
        keys.iter()
            .filter(|key| self.remove_entry(key).is_some())
            .count()
    }

    fn evict_oldest(&mut self) -> Option<CacheKey> {
        let oldest = self.order.peek_oldest()?.clone();
        self.remove_entry(&oldest);
        self.stats.record_eviction();
        debug!(key = %oldest, "Evicted oldest entry");
        Some(oldest)
    }

    fn remove_entry(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.order.remove(key);
        self.tags.remove(key, &entry.meta.tags);
        Some(entry)
    }
}
