//! Access token cache.

use std::future::Future;
use std::time::Duration;

use forwardsflow_core::payment::GatewayError;
use moka::future::Cache;

/// Holds at most one access token, expiring after the configured TTL.
pub(crate) struct TokenCache {
    cache: Cache<(), String>,
}

impl TokenCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    /// Returns the cached token or runs `fetch` once to obtain one.
    ///
    /// Concurrent callers share a single in-flight fetch.
    pub async fn get_or_fetch<F>(&self, fetch: F) -> Result<String, GatewayError>
    where
        F: Future<Output = Result<String, GatewayError>>,
    {
        self.cache
            .try_get_with((), fetch)
            .await
            .map_err(|e| (*e).clone())
    }

    /// Drops the cached token so the next call fetches a fresh one.
    pub async fn invalidate(&self) {
        self.cache.invalidate(&()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_fetches_once_until_invalidated() {
        let cache = TokenCache::new(Duration::from_secs(60));
        let fetches = AtomicUsize::new(0);
        let fetch = || async {
            fetches.fetch_add(1, Ordering::SeqCst);
            Ok::<_, GatewayError>("token".to_string())
        };

        assert_eq!(cache.get_or_fetch(fetch()).await.unwrap(), "token");
        assert_eq!(cache.get_or_fetch(fetch()).await.unwrap(), "token");
        assert_eq!(fetches.load(Ordering::SeqCst), 1);

        cache.invalidate().await;
        cache.get_or_fetch(fetch()).await.unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let cache = TokenCache::new(Duration::from_secs(60));
        let err = cache
            .get_or_fetch(async { Err(GatewayError::Auth("bad credentials".into())) })
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::Auth("bad credentials".into()));

        let ok = cache
            .get_or_fetch(async { Ok("fresh".to_string()) })
            .await
            .unwrap();
        assert_eq!(ok, "fresh");
    }
}
