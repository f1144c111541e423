//! Fetch Module
//!
//! The network side of `cached_fetch`: a [`Fetcher`] performs the upstream
//! call on a cache miss.

mod http;

pub use http::HttpFetcher;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::cache::RequestOptions;
use crate::error::FetchError;

// == Fetch Response ==
/// Result of a fetch, from the network or from the cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchResponse {
    /// HTTP status; always 200 for cache hits
    pub status: u16,
    /// Decoded JSON body (`null` for an empty body)
    pub body: Value,
    pub from_cache: bool,
}

impl FetchResponse {
    /// A response that came off the network.
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
            from_cache: false,
        }
    }

    /// A response served from a cached value.
    pub fn from_cache(body: Value) -> Self {
        Self {
            status: 200,
            body,
            from_cache: true,
        }
    }

    /// Whether the status is 2xx. Only such responses are cached.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// == Fetcher Trait ==
/// Performs the upstream request for a cache miss.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, options: &RequestOptions)
        -> Result<FetchResponse, FetchError>;
}
