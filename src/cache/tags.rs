//! Tag normalization and the reverse `tag -> keys` index.

use std::collections::{HashMap, HashSet};

use super::key::CacheKey;

/// Prefix reserved for namespace tags
pub const NAMESPACE_TAG_PREFIX: &str = "ns:";

/// Namespace used when a write names none
pub const DEFAULT_NAMESPACE: &str = "default";

/// The tag that marks membership of `namespace`.
pub fn namespace_tag(namespace: &str) -> String {
    format!("{NAMESPACE_TAG_PREFIX}{namespace}")
}

/// Tags as stored on an entry of `namespace`.
///
/// Keeps first-seen order, drops duplicates and `ns:` tags naming other
/// namespaces, and ends with the entry's own namespace tag unless the caller
/// already listed it.
pub fn normalize_tags(tags: &[String], namespace: &str) -> Vec<String> {
    let own = namespace_tag(namespace);
    let mut seen = HashSet::with_capacity(tags.len() + 1);
    let mut out: Vec<String> = tags
        .iter()
        .filter(|t| !t.starts_with(NAMESPACE_TAG_PREFIX) || **t == own)
        .filter(|t| seen.insert(t.as_str()))
        .cloned()
        .collect();

    if !out.contains(&own) {
        out.push(own);
    }
    out
}

/// `tags` plus the namespace tag, deduplicated.
pub fn with_namespace_tag(tags: &[String], namespace: &str) -> Vec<String> {
    let own = namespace_tag(namespace);
    let mut seen = HashSet::with_capacity(tags.len() + 1);
    let mut out: Vec<String> = tags
        .iter()
        .filter(|t| seen.insert(t.as_str()))
        .cloned()
        .collect();

    if !out.contains(&own) {
        out.push(own);
    }
    out
}

// == Tag Index ==
/// Reverse index from tag to the keys carrying it.
///
/// Kept in step with the entry map on every insert and removal so that tag
/// and namespace invalidation cost O(matches).
#[derive(Debug, Default)]
pub struct TagIndex {
    by_tag: HashMap<String, HashSet<CacheKey>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &CacheKey, tags: &[String]) {
        for tag in tags {
            self.by_tag
                .entry(tag.clone())
                .or_default()
                .insert(key.clone());
        }
    }

    pub fn remove(&mut self, key: &CacheKey, tags: &[String]) {
        for tag in tags {
            if let Some(keys) = self.by_tag.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.by_tag.remove(tag);
                }
            }
        }
    }

    /// Keys carrying `tag`.
    pub fn keys_for(&self, tag: &str) -> Vec<CacheKey> {
        self.by_tag
            .get(tag)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Keys carrying at least one of `tags`, each listed once.
    pub fn keys_matching_any(&self, tags: &[String]) -> Vec<CacheKey> {
        let mut matched: HashSet<&CacheKey> = HashSet::new();
        for tag in tags {
            if let Some(keys) = self.by_tag.get(tag) {
                matched.extend(keys.iter());
            }
        }
        matched.into_iter().cloned().collect()
    }

    /// Number of distinct tags indexed.
    pub fn tag_count(&self) -> usize {
        self.by_tag.len()
    }

    pub fn clear(&mut self) {
        self.by_tag.clear();
    }
}
