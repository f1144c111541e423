//! Expiry Sweep Task
//!
//! Background task that periodically removes expired cache entries.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::DEFAULT_SWEEP_INTERVAL_SECS;
use crate::engine::ApiCache;

/// Spawns a background task that sweeps expired entries every `interval`.
///
/// The first sweep runs one interval after spawning. A zero interval means
/// the default. Sweeps that remove something are written through to
/// persistence like any other mutation.
///
/// # Returns
/// A JoinHandle for the spawned task; abort it to stop sweeping, e.g.
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let sweep_handle = spawn_sweep_task(cache.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(cache: ApiCache, interval: Duration) -> JoinHandle<()> {
    let interval = if interval.is_zero() {
        Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS)
    } else {
        interval
    };

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep task with interval of {} ms",
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.sweep_expired();

            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use crate::cache::{CacheOptions, ManualClock, RequestOptions};
    use crate::config::CacheConfig;
    use crate::engine::test_support::StubFetcher;
    use crate::persistence::MemoryPersistence;

    fn cache(clock: Arc<ManualClock>) -> ApiCache {
        ApiCache::init_with_clock(
            CacheConfig::default(),
            Arc::new(MemoryPersistence::new()),
            Arc::new(StubFetcher::new()),
            clock,
        )
    }

    #[tokio::test]
    async fn test_sweep_task_removes_expired_entries() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = cache(clock.clone());
        cache.set(
            "/expire_soon",
            &RequestOptions::new(),
            json!("value"),
            &CacheOptions::new().with_ttl_ms(10),
        );

        // Entry is past its TTL but nobody reads it
        clock.set(100);
        let handle = spawn_sweep_task(cache.clone(), Duration::from_millis(20));

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cache.is_empty(), "Expired entry should have been swept");
        assert_eq!(cache.stats().misses, 0, "Sweeping is not a lookup");

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_preserves_valid_entries() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = cache(clock.clone());
        cache.set(
            "/long_lived",
            &RequestOptions::new(),
            json!("value"),
            &CacheOptions::new().with_ttl_ms(3_600_000),
        );

        clock.set(1_000);
        let handle = spawn_sweep_task(cache.clone(), Duration::from_millis(20));

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(
            cache.get("/long_lived", &RequestOptions::new()),
            Some(json!("value")),
            "Valid entry should not be removed"
        );

        handle.abort();
    }

    #[tokio::test]
    async fn test_zero_interval_falls_back_to_default() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = cache(clock.clone());
        cache.set(
            "/expired",
            &RequestOptions::new(),
            json!("value"),
            &CacheOptions::new().with_ttl_ms(10),
        );
        clock.set(100);

        let handle = spawn_sweep_task(cache.clone(), Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(100)).await;

        // No sweep yet: the first one is a full default interval away
        assert_eq!(cache.len(), 1);
        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_can_be_aborted() {
        let cache = cache(Arc::new(ManualClock::new(0)));

        let handle = spawn_sweep_task(cache, Duration::from_secs(1));

        // Abort immediately
        handle.abort();

        // Wait a bit and verify task is finished
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
