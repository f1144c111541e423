//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::options::RequestOptions;
use super::tags::{normalize_tags, DEFAULT_NAMESPACE};

// == Entry Metadata ==
/// Everything known about an entry besides its value.
///
/// Field names match the persisted snapshot layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryMetadata {
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
    /// URL of the request that produced the value
    pub url: String,
    /// Request options at insertion time
    #[serde(default)]
    pub options: RequestOptions,
    /// Invalidation tags, always including exactly one `ns:` tag
    #[serde(default)]
    pub tags: Vec<String>,
    /// Namespace, mirrored by the `ns:` tag
    #[serde(default)]
    pub namespace: String,
}

impl EntryMetadata {
    // == Constructor ==
    /// Builds metadata for an entry written at `now_ms` with `ttl_ms` to live.
    ///
    /// Tags are deduplicated and the namespace tag is appended if missing.
    pub fn new(
        now_ms: u64,
        ttl_ms: u64,
        url: impl Into<String>,
        options: RequestOptions,
        tags: &[String],
        namespace: &str,
    ) -> Self {
        Self {
            created_at: now_ms,
            expires_at: now_ms.saturating_add(ttl_ms),
            url: url.into(),
            options,
            tags: normalize_tags(tags, namespace),
            namespace: namespace.to_string(),
        }
    }

    // == Is Expired ==
    /// An entry is expired strictly after its expiry instant.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Re-establishes the tag invariant on metadata read from outside.
    pub(crate) fn normalized(mut self) -> Self {
        if self.namespace.is_empty() {
            self.namespace = DEFAULT_NAMESPACE.to_string();
        }
        self.tags = normalize_tags(&self.tags, &self.namespace);
        self
    }
}

// == Cache Entry ==
/// A cached value joined with its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// The cached payload
    pub value: Value,
    pub meta: EntryMetadata,
}

impl CacheEntry {
    pub fn new(value: Value, meta: EntryMetadata) -> Self {
        Self { value, meta }
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.meta.is_expired(now_ms)
    }
}
