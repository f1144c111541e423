//! Configuration Module
//!
//! Handles loading and managing cache and server configuration from
//! environment variables.

use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// Default TTL applied when a write does not carry its own (5 minutes)
pub const DEFAULT_TTL_MS: u64 = 5 * 60 * 1000;

/// Default bound on the number of cached entries
pub const DEFAULT_MAX_CACHE_SIZE: usize = 100;

/// Default interval between expiry sweeps
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

// == Cache Config ==
/// Engine-level settings handed to [`ApiCache::init`](crate::ApiCache::init).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL in milliseconds for writes without an explicit TTL
    pub default_ttl_ms: u64,
    /// Maximum number of entries the store can hold
    pub max_cache_size: usize,
    /// Coalesce concurrent misses on the same key into one upstream call
    pub single_flight: bool,
}

impl CacheConfig {
    /// Builds a config, treating zero values as "use the default".
    pub fn new(default_ttl_ms: u64, max_cache_size: usize) -> Self {
        Self {
            default_ttl_ms: if default_ttl_ms == 0 {
                DEFAULT_TTL_MS
            } else {
                default_ttl_ms
            },
            max_cache_size: if max_cache_size == 0 {
                DEFAULT_MAX_CACHE_SIZE
            } else {
                max_cache_size
            },
            single_flight: true,
        }
    }

    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_MS, DEFAULT_MAX_CACHE_SIZE)
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default TTL in milliseconds for entries without explicit TTL
    pub default_ttl_ms: u64,
    /// Maximum number of entries the cache can hold
    pub max_cache_size: usize,
    /// Background sweep interval in seconds
    pub sweep_interval: u64,
    /// Address the admin API binds to
    pub server_host: IpAddr,
    /// HTTP server port
    pub server_port: u16,
    /// File backing the persisted snapshot
    pub cache_file: PathBuf,
    /// Whether concurrent misses share one upstream call
    pub single_flight: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `MAX_CACHE_SIZE` - Maximum cache entries (default: 100)
    /// - `SWEEP_INTERVAL_SECS` - Expiry sweep frequency in seconds (default: 60)
    /// - `SERVER_HOST` - Bind address (default: 127.0.0.1)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_FILE` - Snapshot file path (default: api-cache.json)
    /// - `SINGLE_FLIGHT` - Coalesce concurrent misses (default: true)
    ///
    /// Zero for the TTL, size or sweep interval means the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ttl_ms: parse_var("DEFAULT_TTL_MS").unwrap_or(defaults.default_ttl_ms),
            max_cache_size: parse_var("MAX_CACHE_SIZE").unwrap_or(defaults.max_cache_size),
            sweep_interval: parse_var::<u64>("SWEEP_INTERVAL_SECS")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.sweep_interval),
            server_host: parse_var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cache_file: env::var("CACHE_FILE")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_file),
            single_flight: parse_var("SINGLE_FLIGHT").unwrap_or(defaults.single_flight),
        }
    }

    /// Engine settings derived from this server config.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new(self.default_ttl_ms, self.max_cache_size)
            .with_single_flight(self.single_flight)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl_ms: DEFAULT_TTL_MS,
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            sweep_interval: DEFAULT_SWEEP_INTERVAL_SECS,
            server_host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            server_port: 3000,
            cache_file: PathBuf::from("api-cache.json"),
            single_flight: true,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
