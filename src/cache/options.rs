//! Request and cache options carried by every read and write.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::key::DEFAULT_METHOD;
use super::tags::DEFAULT_NAMESPACE;

// == Request Options ==
/// Describes the upstream request a cache entry stands for.
///
/// A copy is kept in each entry's metadata as it was at insertion time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    /// HTTP method, `GET` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Request headers, sent verbatim (not part of the cache key)
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// JSON request body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Effective HTTP method.
    pub fn method(&self) -> &str {
        self.method
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_METHOD)
    }
}

// == Cache Options ==
/// Per-write caching directives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheOptions {
    /// TTL in milliseconds; `None` or `0` means the configured default
    pub ttl_ms: Option<u64>,
    /// Invalidation tags
    pub tags: Vec<String>,
    /// Namespace, `"default"` when absent
    pub namespace: Option<String>,
    /// When false, fetched responses are not written to the cache
    pub enabled: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            ttl_ms: None,
            tags: Vec::new(),
            namespace: None,
            enabled: true,
        }
    }
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.ttl_ms = Some(ttl_ms);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Fetch through the cache without storing the response.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Namespace this write lands in.
    pub fn namespace_or_default(&self) -> &str {
        self.namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .unwrap_or(DEFAULT_NAMESPACE)
    }

    /// TTL to apply given the configured default.
    pub fn effective_ttl_ms(&self, default_ttl_ms: u64) -> u64 {
        self.ttl_ms.filter(|ttl| *ttl > 0).unwrap_or(default_ttl_ms)
    }
}
