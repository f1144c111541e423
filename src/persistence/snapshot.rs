//! Serialized form of the entry store.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::{CacheEntry, CacheKey, EntryMetadata, EntryStore};

// == Snapshot ==
/// Values and metadata as two parallel `[key, item]` lists.
///
/// ```json
/// {"cache": [["GET /a ", {...}]], "metadata": [["GET /a ", {"createdAt": 0, ...}]]}
/// ```
///
/// Lists are written oldest entry first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub cache: Vec<(CacheKey, Value)>,
    pub metadata: Vec<(CacheKey, EntryMetadata)>,
}

impl Snapshot {
    /// Captures every entry currently in `store`, expired or not.
    pub fn from_store(store: &EntryStore) -> Self {
        let mut snapshot = Self {
            cache: Vec::with_capacity(store.len()),
            metadata: Vec::with_capacity(store.len()),
        };
        for (key, entry) in store.iter() {
            snapshot.cache.push((key.clone(), entry.value.clone()));
            snapshot.metadata.push((key.clone(), entry.meta.clone()));
        }
        snapshot
    }

    /// Joins the two lists back into entries, in metadata order.
    ///
    /// A key present in only one list is dropped. When a key repeats, the
    /// last occurrence wins.
    pub fn into_entries(self) -> Vec<(CacheKey, CacheEntry)> {
        let mut values: HashMap<CacheKey, Value> = self.cache.into_iter().collect();
        let mut seen: HashMap<CacheKey, usize> = HashMap::new();
        let mut entries: Vec<(CacheKey, CacheEntry)> = Vec::with_capacity(self.metadata.len());

        for (key, meta) in self.metadata {
            if let Some(&slot) = seen.get(&key) {
                if let Some((_, entry)) = entries.get_mut(slot) {
                    entry.meta = meta;
                }
                continue;
            }
            let Some(value) = values.remove(&key) else {
                continue;
            };
            seen.insert(key.clone(), entries.len());
            entries.push((key, CacheEntry::new(value, meta)));
        }
        entries
    }

    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }
}
