//! API Cache - a request/response caching engine
//!
//! Caches JSON responses keyed by request, with TTL expiration, bounded
//! oldest-first eviction, tag/namespace/pattern invalidation and
//! write-through persistence. Ships with a small admin HTTP API.

pub mod api;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod models;
pub mod namespace;
pub mod persistence;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::{CacheKey, CacheOptions, RequestOptions};
pub use config::{CacheConfig, Config};
pub use engine::ApiCache;
pub use error::{CacheError, FetchError};
pub use fetch::{FetchResponse, Fetcher, HttpFetcher};
pub use namespace::NamespacedCache;
pub use persistence::{FilePersistence, MemoryPersistence, Persistence};
pub use tasks::spawn_sweep_task;
