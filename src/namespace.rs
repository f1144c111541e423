//! Namespace Facade
//!
//! A view of the cache bound to one namespace. Every write made through it
//! lands in that namespace and carries its `ns:` tag, and every
//! invalidation stays inside it.

use serde_json::Value;

use crate::cache::{
    namespace_tag, with_namespace_tag, CacheKey, CacheOptions, RequestOptions, DEFAULT_NAMESPACE,
};
use crate::engine::ApiCache;
use crate::error::FetchError;
use crate::fetch::FetchResponse;

/// Scoped handle returned by [`ApiCache::namespace`].
#[derive(Debug, Clone)]
pub struct NamespacedCache {
    cache: ApiCache,
    name: String,
    tag: String,
}

impl NamespacedCache {
    pub(crate) fn new(cache: ApiCache, name: &str) -> Self {
        let name = if name.is_empty() {
            DEFAULT_NAMESPACE
        } else {
            name
        };
        Self {
            cache,
            name: name.to_string(),
            tag: namespace_tag(name),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `ns:<name>` tag carried by every entry of this namespace.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// [`ApiCache::cached_fetch`] with the namespace and its tag injected.
    pub async fn cached_fetch(
        &self,
        url: &str,
        options: RequestOptions,
        cache_options: CacheOptions,
    ) -> Result<FetchResponse, FetchError> {
        self.cache
            .cached_fetch(url, options, self.scoped(cache_options))
            .await
    }

    /// [`ApiCache::set`] with the namespace and its tag injected.
    pub fn set(
        &self,
        url: &str,
        options: &RequestOptions,
        value: Value,
        cache_options: CacheOptions,
    ) -> CacheKey {
        self.cache
            .set(url, options, value, &self.scoped(cache_options))
    }

    /// Removes every entry of this namespace.
    pub fn invalidate(&self) -> usize {
        self.cache.invalidate_namespace(&self.name)
    }

    /// Removes entries carrying any of `tags` or this namespace's tag.
    ///
    /// The namespace tag is always part of the match, which takes the whole
    /// namespace. Entries of other namespaces are never touched, whatever
    /// tags they carry.
    pub fn invalidate_tags(&self, tags: &[String]) -> usize {
        let tags = with_namespace_tag(tags, &self.name);
        self.cache.invalidate_tags_in_namespace(&self.name, &tags)
    }

    /// Same as [`invalidate`](Self::invalidate).
    pub fn clear(&self) -> usize {
        self.invalidate()
    }

    fn scoped(&self, mut cache_options: CacheOptions) -> CacheOptions {
        cache_options.tags = with_namespace_tag(&cache_options.tags, &self.name);
        cache_options.namespace = Some(self.name.clone());
        cache_options
    }
}
