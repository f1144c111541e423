//! Bulk invalidation over the entry store: by tag, by namespace, by URL pattern.
//!
//! All of these only remove entries. Survivors keep their value, metadata and
//! position in the eviction order.

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::cache::{namespace_tag, CacheKey, EntryStore};
use crate::error::Result;

/// Upper bound on the compiled size of a caller-supplied pattern, in bytes
pub const MAX_PATTERN_SIZE: usize = 1 << 20;

/// Compiles an untrusted URL pattern.
///
/// The regex engine runs in linear time, so no input can backtrack
/// catastrophically; the size limit bounds compile cost and memory.
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    let regex = RegexBuilder::new(pattern)
        .size_limit(MAX_PATTERN_SIZE)
        .dfa_size_limit(MAX_PATTERN_SIZE)
        .build()?;
    Ok(regex)
}

impl EntryStore {
    /// Removes every entry carrying at least one of `tags`.
    pub fn invalidate_by_tags(&mut self, tags: &[String]) -> usize {
        let keys = self.tag_index().keys_matching_any(tags);
        let removed = self.remove_keys(&keys);
        debug!(?tags, removed, "Invalidated entries by tag");
        removed
    }

    /// Removes entries of `namespace` carrying any of `tags` or the
    /// namespace's own `ns:` tag.
    ///
    /// Every entry of the namespace carries that tag, so the whole namespace
    /// goes. Entries of other namespaces are never touched, whatever tags
    /// they share with the request.
    pub fn invalidate_tags_in_namespace(&mut self, namespace: &str, tags: &[String]) -> usize {
        let mut union = tags.to_vec();
        let own = namespace_tag(namespace);
        if !union.contains(&own) {
            union.push(own);
        }

        let keys: Vec<CacheKey> = self
            .tag_index()
            .keys_matching_any(&union)
            .into_iter()
            .filter(|key| {
                self.peek(key)
                    .map(|entry| entry.meta.namespace == namespace)
                    .unwrap_or(false)
            })
            .collect();
        let removed = self.remove_keys(&keys);
        debug!(namespace, ?tags, removed, "Invalidated namespaced entries by tag");
        removed
    }

    /// Removes every entry whose URL matches `pattern`.
    pub fn invalidate_by_pattern(&mut self, pattern: &Regex) -> usize {
        let keys: Vec<CacheKey> = self
            .iter()
            .filter(|(_, entry)| pattern.is_match(&entry.meta.url))
            .map(|(key, _)| key.clone())
            .collect();
        let removed = self.remove_keys(&keys);
        debug!(pattern = pattern.as_str(), removed, "Invalidated entries by pattern");
        removed
    }

    /// Removes every entry of `namespace`. An empty name removes nothing.
    pub fn invalidate_namespace(&mut self, namespace: &str) -> usize {
        if namespace.is_empty() {
            return 0;
        }
        let keys = self.tag_index().keys_for(&namespace_tag(namespace));
        let removed = self.remove_keys(&keys);
        debug!(namespace, removed, "Invalidated namespace");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{EntryMetadata, Lookup, RequestOptions};
    use crate::error::CacheError;
    use serde_json::json;

    fn strings(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    fn put(store: &mut EntryStore, key: &str, url: &str, tags: &[&str], ns: &str, now: u64) {
        let meta = EntryMetadata::new(now, 60_000, url, RequestOptions::new(), &strings(tags), ns);
        store.set(CacheKey::from_raw(key), json!({ "key": key }), meta);
    }

    fn has(store: &EntryStore, key: &str) -> bool {
        store.contains(&CacheKey::from_raw(key))
    }

    #[test]
    fn test_invalidate_by_tags_scenario() {
        let mut store = EntryStore::new(100);
        put(&mut store, "a", "/a", &["planet"], "default", 0);
        put(&mut store, "b", "/b", &["user"], "default", 1);

        assert_eq!(store.invalidate_by_tags(&strings(&["planet"])), 1);

        assert_eq!(store.get(&CacheKey::from_raw("a"), "/a", 2), Lookup::Miss);
        assert_eq!(
            store.get(&CacheKey::from_raw("b"), "/b", 2),
            Lookup::Hit(json!({"key": "b"}))
        );
    }

    #[test]
    fn test_invalidate_by_tags_any_intersection() {
        let mut store = EntryStore::new(100);
        put(&mut store, "a", "/a", &["x", "y"], "default", 0);
        put(&mut store, "b", "/b", &["y"], "default", 1);
        put(&mut store, "c", "/c", &["z"], "default", 2);

        assert_eq!(store.invalidate_by_tags(&strings(&["y", "missing"])), 2);
        assert!(!has(&store, "a"));
        assert!(!has(&store, "b"));
        assert!(has(&store, "c"));
    }

    #[test]
    fn test_invalidate_leaves_survivors_untouched() {
        let mut store = EntryStore::new(100);
        put(&mut store, "a", "/a", &["gone"], "default", 0);
        put(&mut store, "b", "/b", &["kept"], "default", 5);
        let before = store.peek(&CacheKey::from_raw("b")).cloned();

        store.invalidate_by_tags(&strings(&["gone"]));

        assert_eq!(store.peek(&CacheKey::from_raw("b")).cloned(), before);
    }

    #[test]
    fn test_invalidate_by_empty_tags_is_noop() {
        let mut store = EntryStore::new(100);
        put(&mut store, "a", "/a", &["x"], "default", 0);
        assert_eq!(store.invalidate_by_tags(&[]), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_invalidate_namespace() {
        let mut store = EntryStore::new(100);
        put(&mut store, "a1", "/a1", &[], "a", 0);
        put(&mut store, "a2", "/a2", &["t"], "a", 1);
        put(&mut store, "b1", "/b1", &["t"], "b", 2);

        assert_eq!(store.invalidate_namespace("b"), 1);
        assert!(has(&store, "a1"));
        assert!(has(&store, "a2"));

        assert_eq!(store.invalidate_namespace("a"), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_invalidate_empty_namespace_is_noop() {
        let mut store = EntryStore::new(100);
        put(&mut store, "a", "/a", &[], "default", 0);
        assert_eq!(store.invalidate_namespace(""), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_invalidate_tags_in_namespace_unions_namespace_tag() {
        let mut store = EntryStore::new(100);
        put(&mut store, "mine-tagged", "/1", &["planet"], "mine", 0);
        put(&mut store, "mine-other", "/2", &["user"], "mine", 1);
        put(&mut store, "theirs-tagged", "/3", &["planet"], "theirs", 2);
        put(&mut store, "theirs-ns", "/4", &["ns:mine"], "theirs", 3);

        let removed = store.invalidate_tags_in_namespace("mine", &strings(&["planet"]));

        // ns:mine is part of the match, so untagged siblings go too
        assert_eq!(removed, 2);
        assert!(!has(&store, "mine-tagged"));
        assert!(!has(&store, "mine-other"));
        assert!(has(&store, "theirs-tagged"));
        assert!(has(&store, "theirs-ns"));
    }

    #[test]
    fn test_invalidate_tags_in_namespace_without_tags_clears_namespace() {
        let mut store = EntryStore::new(100);
        put(&mut store, "m1", "/1", &["planet"], "mine", 0);
        put(&mut store, "m2", "/2", &[], "mine", 1);
        put(&mut store, "t1", "/3", &[], "theirs", 2);

        assert_eq!(store.invalidate_tags_in_namespace("mine", &[]), 2);
        assert!(has(&store, "t1"));
    }

    #[test]
    fn test_invalidate_by_pattern() {
        let mut store = EntryStore::new(100);
        put(&mut store, "p1", "https://api.example.com/planets/1", &[], "default", 0);
        put(&mut store, "p2", "https://api.example.com/planets/2", &[], "default", 1);
        put(&mut store, "u1", "https://api.example.com/users/1", &[], "default", 2);

        let pattern = Regex::new(r"/planets/\d+$").unwrap();
        assert_eq!(store.invalidate_by_pattern(&pattern), 2);
        assert!(has(&store, "u1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_compile_pattern_rejects_invalid() {
        let result = compile_pattern("planets/(");
        assert!(matches!(result, Err(CacheError::InvalidPattern(_))));
    }

    #[test]
    fn test_compile_pattern_rejects_oversized() {
        // Large counted repetition blows the compiled size limit
        let result = compile_pattern(r"(\w{1000}){1000}");
        assert!(matches!(result, Err(CacheError::InvalidPattern(_))));
    }

    #[test]
    fn test_compile_pattern_handles_backtracking_classic() {
        let regex = compile_pattern(r"^(a+)+$").unwrap();
        let input = format!("{}b", "a".repeat(10_000));
        assert!(!regex.is_match(&input));
    }
}
