//! Engine Module
//!
//! [`ApiCache`] ties the entry store to a persistence substrate, an upstream
//! fetcher and a clock. Every mutation that changes the store is written
//! through to persistence before the call returns.

mod fetch;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use regex::Regex;
use serde_json::Value;
use tracing::{info, warn};

use crate::cache::{
    compile_pattern, key_for, CacheEntry, CacheKey, CacheOptions, CacheStats, Clock,
    EntryMetadata, EntryStore, Lookup, RequestOptions, StatsEvent, SystemClock,
};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::namespace::NamespacedCache;
use crate::persistence::{Persistence, Snapshot};

use self::fetch::InFlight;

// == Api Cache ==
/// Request/response cache with tag, namespace and pattern invalidation.
///
/// Cheap to clone; clones share the same store.
#[derive(Clone)]
pub struct ApiCache {
    inner: Arc<Inner>,
}

struct Inner {
    store: Mutex<EntryStore>,
    config: CacheConfig,
    persistence: Arc<dyn Persistence>,
    fetcher: Arc<dyn Fetcher>,
    clock: Arc<dyn Clock>,
    /// Pending upstream fetches, one per key
    in_flight: Mutex<HashMap<CacheKey, InFlight>>,
}

impl ApiCache {
    // == Init ==
    /// Builds a cache and hydrates it from `persistence`.
    pub fn init(
        config: CacheConfig,
        persistence: Arc<dyn Persistence>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self::init_with_clock(config, persistence, fetcher, Arc::new(SystemClock))
    }

    /// Like [`init`](Self::init) with an explicit time source.
    ///
    /// A missing or unreadable snapshot starts an empty store. Restored
    /// entries that have already expired are dropped, then the oldest are
    /// evicted until the size bound holds.
    pub fn init_with_clock(
        config: CacheConfig,
        persistence: Arc<dyn Persistence>,
        fetcher: Arc<dyn Fetcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut store = EntryStore::new(config.max_cache_size);

        let restored = match persistence.load() {
            Ok(Some(snapshot)) => {
                let entries = snapshot.into_entries();
                let count = entries.len();
                for (key, entry) in entries {
                    store.restore(key, entry);
                }
                count
            }
            Ok(None) => 0,
            Err(err) => {
                warn!(error = %err, "Failed to load cache snapshot, starting empty");
                0
            }
        };

        let expired = store.sweep_expired(clock.now_ms());
        let trimmed = store.trim_to_capacity();
        info!(
            restored,
            expired,
            trimmed,
            entries = store.len(),
            "Cache hydrated"
        );

        let cache = Self {
            inner: Arc::new(Inner {
                store: Mutex::new(store),
                config,
                persistence,
                fetcher,
                clock,
                in_flight: Mutex::new(HashMap::new()),
            }),
        };
        if expired + trimmed > 0 {
            cache.persist(&cache.lock_store());
        }
        cache
    }

    // == Get ==
    /// Cached value for `url` requested with `options`, if present and live.
    pub fn get(&self, url: &str, options: &RequestOptions) -> Option<Value> {
        self.lookup(&key_for(url, options), url)
    }

    // == Set ==
    /// Caches `value` for `url` requested with `options`. Returns its key.
    pub fn set(
        &self,
        url: &str,
        options: &RequestOptions,
        value: Value,
        cache_options: &CacheOptions,
    ) -> CacheKey {
        let key = key_for(url, options);
        self.insert(key.clone(), url, options.clone(), value, cache_options);
        key
    }

    // == Delete ==
    /// Removes one entry. Returns whether it was present.
    pub fn delete(&self, key: &CacheKey) -> bool {
        let mut store = self.lock_store();
        let removed = store.delete(key);
        self.persist(&store);
        removed
    }

    // == Invalidation ==
    /// Removes every entry carrying at least one of `tags`.
    pub fn invalidate_by_tags(&self, tags: &[String]) -> usize {
        self.mutate(|store| store.invalidate_by_tags(tags))
    }

    /// Removes every entry whose URL matches `pattern`.
    pub fn invalidate_by_pattern(&self, pattern: &Regex) -> usize {
        self.mutate(|store| store.invalidate_by_pattern(pattern))
    }

    /// Compiles `pattern` and removes every entry whose URL matches it.
    pub fn invalidate_by_pattern_str(&self, pattern: &str) -> Result<usize> {
        let regex = compile_pattern(pattern)?;
        Ok(self.invalidate_by_pattern(&regex))
    }

    /// Removes every entry of `namespace`. An empty name removes nothing.
    pub fn invalidate_namespace(&self, namespace: &str) -> usize {
        self.mutate(|store| store.invalidate_namespace(namespace))
    }

    /// Removes entries of `namespace` carrying any of `tags` or its `ns:`
    /// tag, which is the whole namespace. Other namespaces are untouched.
    pub fn invalidate_tags_in_namespace(&self, namespace: &str, tags: &[String]) -> usize {
        self.mutate(|store| store.invalidate_tags_in_namespace(namespace, tags))
    }

    // == Clear ==
    /// Removes every entry. Returns how many there were.
    pub fn clear(&self) -> usize {
        let mut store = self.lock_store();
        let removed = store.clear();
        self.persist(&store);
        info!(removed, "Cache cleared");
        removed
    }

    // == Sweep ==
    /// Removes every expired entry, read or not.
    pub fn sweep_expired(&self) -> usize {
        let now = self.now_ms();
        self.mutate(|store| store.sweep_expired(now))
    }

    /// Scoped view that tags every write with `ns:<name>`.
    pub fn namespace(&self, name: &str) -> NamespacedCache {
        NamespacedCache::new(self.clone(), name)
    }

    // == Accessors ==
    pub fn stats(&self) -> CacheStats {
        self.lock_store().stats()
    }

    /// Recent hit/miss events, oldest first.
    pub fn events(&self) -> Vec<StatsEvent> {
        self.lock_store().events()
    }

    pub fn len(&self) -> usize {
        self.lock_store().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_store().is_empty()
    }

    /// Entry under `key` without counting a lookup or checking expiry.
    pub fn peek_entry(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.lock_store().peek(key).cloned()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    pub fn now_ms(&self) -> u64 {
        self.inner.clock.now_ms()
    }

    // == Internals ==
    fn lookup(&self, key: &CacheKey, url: &str) -> Option<Value> {
        let now = self.now_ms();
        let mut store = self.lock_store();
        let lookup = store.get(key, url, now);
        if lookup == Lookup::Expired {
            self.persist(&store);
        }
        lookup.into_value()
    }

    fn insert(
        &self,
        key: CacheKey,
        url: &str,
        options: RequestOptions,
        value: Value,
        cache_options: &CacheOptions,
    ) {
        let ttl_ms = cache_options.effective_ttl_ms(self.inner.config.default_ttl_ms);
        let meta = EntryMetadata::new(
            self.now_ms(),
            ttl_ms,
            url,
            options,
            &cache_options.tags,
            cache_options.namespace_or_default(),
        );

        let mut store = self.lock_store();
        store.set(key, value, meta);
        self.persist(&store);
    }

    /// Runs a removal and persists if it removed anything.
    fn mutate(&self, op: impl FnOnce(&mut EntryStore) -> usize) -> usize {
        let mut store = self.lock_store();
        let removed = op(&mut store);
        if removed > 0 {
            self.persist(&store);
        }
        removed
    }

    fn lock_store(&self) -> MutexGuard<'_, EntryStore> {
        self.inner
            .store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, store: &EntryStore) {
        if let Err(err) = self.inner.persistence.save(&Snapshot::from_store(store)) {
            warn!(error = %err, "Failed to persist cache snapshot");
        }
    }
}

impl fmt::Debug for ApiCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCache")
            .field("config", &self.inner.config)
            .field("clock", &self.inner.clock)
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}
