//! `cached_fetch`: serve from the cache, else fetch upstream and populate.

use std::sync::PoisonError;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::oneshot;
use tracing::debug;

use super::ApiCache;
use crate::cache::{key_for, CacheKey, CacheOptions, RequestOptions};
use crate::error::FetchError;
use crate::fetch::FetchResponse;

/// An upstream fetch that concurrent misses on one key can all await.
pub(super) type InFlight = Shared<BoxFuture<'static, Result<FetchResponse, FetchError>>>;

impl ApiCache {
    // == Cached Fetch ==
    /// Returns the cached response for the request, or fetches it.
    ///
    /// A hit answers with status 200 and never touches the network. On a
    /// miss the upstream response is returned as is, and cached when it is
    /// 2xx and `cache_options.enabled`. Upstream errors are returned
    /// unchanged and nothing is cached.
    ///
    /// With single-flight enabled, concurrent misses on the same key share
    /// one upstream call and the first caller's `cache_options` apply.
    pub async fn cached_fetch(
        &self,
        url: &str,
        options: RequestOptions,
        cache_options: CacheOptions,
    ) -> Result<FetchResponse, FetchError> {
        let key = key_for(url, &options);
        if let Some(body) = self.lookup(&key, url) {
            return Ok(FetchResponse::from_cache(body));
        }

        if !self.inner.config.single_flight {
            return self
                .fetch_and_store(key, url.to_string(), options, cache_options)
                .await;
        }
        self.join_flight(key, url, options, cache_options).await
    }

    /// The pending fetch for `key`, started if there is none.
    ///
    /// The fetch runs on its own task, so it stores the result and clears its
    /// slot even when every waiter has gone away.
    fn join_flight(
        &self,
        key: CacheKey,
        url: &str,
        options: RequestOptions,
        cache_options: CacheOptions,
    ) -> InFlight {
        let mut in_flight = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(pending) = in_flight.get(&key) {
            debug!(key = %key, "Joining in-flight fetch");
            return pending.clone();
        }

        let (tx, rx) = oneshot::channel();
        let flight = async move {
            rx.await
                .unwrap_or_else(|_| Err(FetchError::Aborted("fetch task dropped".to_string())))
        }
        .boxed()
        .shared();
        in_flight.insert(key.clone(), flight.clone());
        drop(in_flight);

        let guard = FlightGuard {
            cache: self.clone(),
            key,
        };
        let url = url.to_string();
        tokio::spawn(async move {
            let result = guard
                .cache
                .fetch_and_store(guard.key.clone(), url, options, cache_options)
                .await;
            // Cached by now, so later callers hit instead of joining
            drop(guard);
            let _ = tx.send(result);
        });

        flight
    }

    fn finish_flight(&self, key: &CacheKey) {
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    async fn fetch_and_store(
        &self,
        key: CacheKey,
        url: String,
        options: RequestOptions,
        cache_options: CacheOptions,
    ) -> Result<FetchResponse, FetchError> {
        let response = match self.inner.fetcher.fetch(&url, &options).await {
            Ok(response) => response,
            Err(err) => {
                debug!(url = %url, error = %err, "Upstream fetch failed");
                return Err(err);
            }
        };

        if response.is_ok() && cache_options.enabled {
            self.insert(key, &url, options, response.body.clone(), &cache_options);
        } else {
            debug!(url = %url, status = response.status, "Response not cached");
        }
        Ok(response)
    }

    /// Number of upstream fetches currently shared between callers.
    pub fn in_flight_len(&self) -> usize {
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Clears the in-flight slot when the fetch task ends, panics included.
struct FlightGuard {
    cache: ApiCache,
    key: CacheKey,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.cache.finish_flight(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::cache::ManualClock;
    use crate::config::CacheConfig;
    use crate::engine::test_support::StubFetcher;
    use crate::persistence::MemoryPersistence;
    use serde_json::json;

    fn cache(fetcher: Arc<StubFetcher>, single_flight: bool) -> ApiCache {
        ApiCache::init_with_clock(
            CacheConfig::default().with_single_flight(single_flight),
            Arc::new(MemoryPersistence::new()),
            fetcher,
            Arc::new(ManualClock::new(0)),
        )
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let fetcher = Arc::new(StubFetcher::new());
        let cache = cache(fetcher.clone(), true);

        let first = cache
            .cached_fetch("/planets", RequestOptions::new(), CacheOptions::new())
            .await
            .unwrap();
        let second = cache
            .cached_fetch("/planets", RequestOptions::new(), CacheOptions::new())
            .await
            .unwrap();

        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(second.status, 200);
        assert_eq!(second.body, first.body);
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(cache.in_flight_len(), 0);
    }

    #[tokio::test]
    async fn test_tags_and_namespace_are_applied() {
        let fetcher = Arc::new(StubFetcher::new());
        let cache = cache(fetcher, true);
        let options = CacheOptions::new()
            .with_tag("planet")
            .with_namespace("astro")
            .with_ttl_ms(50);

        cache
            .cached_fetch("/planets", RequestOptions::new(), options)
            .await
            .unwrap();

        let key = key_for("/planets", &RequestOptions::new());
        let entry = cache.peek_entry(&key).unwrap();
        assert_eq!(entry.meta.tags, vec!["planet", "ns:astro"]);
        assert_eq!(entry.meta.namespace, "astro");
        assert_eq!(entry.meta.expires_at, 50);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_fetch() {
        let fetcher = Arc::new(StubFetcher::new().with_delay(Duration::from_millis(50)));
        let cache = cache(fetcher.clone(), true);

        let (a, b) = tokio::join!(
            cache.cached_fetch("/slow", RequestOptions::new(), CacheOptions::new()),
            cache.cached_fetch("/slow", RequestOptions::new(), CacheOptions::new()),
        );

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.in_flight_len(), 0);
    }

    #[tokio::test]
    async fn test_abandoned_flights_still_complete() {
        let fetcher = Arc::new(StubFetcher::new().with_delay(Duration::from_millis(300)));
        let cache = cache(fetcher.clone(), true);

        for n in 0..10 {
            let url = format!("/slow/{n}");
            let call = cache.cached_fetch(&url, RequestOptions::new(), CacheOptions::new());
            let result = tokio::time::timeout(Duration::from_millis(5), call).await;
            assert!(result.is_err());
        }
        assert_eq!(cache.in_flight_len(), 10);

        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(cache.in_flight_len(), 0);
        assert_eq!(fetcher.calls(), 10);
        assert_eq!(cache.len(), 10);
    }

    #[tokio::test]
    async fn test_concurrent_misses_without_single_flight_both_fetch() {
        let fetcher = Arc::new(StubFetcher::new().with_delay(Duration::from_millis(50)));
        let cache = cache(fetcher.clone(), false);

        let (a, b) = tokio::join!(
            cache.cached_fetch("/slow", RequestOptions::new(), CacheOptions::new()),
            cache.cached_fetch("/slow", RequestOptions::new(), CacheOptions::new()),
        );

        assert_eq!(fetcher.calls(), 2);
        assert!(!a.unwrap().from_cache);
        assert!(!b.unwrap().from_cache);
        // Last write wins, one entry
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_share() {
        let fetcher = Arc::new(StubFetcher::new().with_delay(Duration::from_millis(20)));
        let cache = cache(fetcher.clone(), true);

        let (_, _) = tokio::join!(
            cache.cached_fetch("/a", RequestOptions::new(), CacheOptions::new()),
            cache.cached_fetch("/b", RequestOptions::new(), CacheOptions::new()),
        );

        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_errors_propagate_and_are_not_cached() {
        let fetcher = Arc::new(StubFetcher::new().failing());
        let cache = cache(fetcher.clone(), true);

        for _ in 0..2 {
            let result = cache
                .cached_fetch("/down", RequestOptions::new(), CacheOptions::new())
                .await;
            assert_eq!(
                result,
                Err(FetchError::Transport("connection refused".to_string()))
            );
        }
        assert_eq!(fetcher.calls(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.in_flight_len(), 0);
    }

    #[tokio::test]
    async fn test_non_2xx_is_returned_but_not_cached() {
        let fetcher = Arc::new(StubFetcher::new().with_status(404));
        let cache = cache(fetcher.clone(), true);

        let response = cache
            .cached_fetch("/missing", RequestOptions::new(), CacheOptions::new())
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_caching_skips_store() {
        let fetcher = Arc::new(StubFetcher::new());
        let cache = cache(fetcher.clone(), true);

        for _ in 0..2 {
            cache
                .cached_fetch("/live", RequestOptions::new(), CacheOptions::new().disabled())
                .await
                .unwrap();
        }

        assert_eq!(fetcher.calls(), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_method_reaches_fetcher() {
        let fetcher = Arc::new(StubFetcher::new());
        let cache = cache(fetcher, true);
        let options = RequestOptions::new()
            .with_method("POST")
            .with_body(json!({"q": 1}));

        let response = cache
            .cached_fetch("/search", options, CacheOptions::new())
            .await
            .unwrap();

        assert_eq!(response.body["method"], "POST");
    }
}
