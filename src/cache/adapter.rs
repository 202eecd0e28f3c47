//! Cache Store Adapter
//!
//! Typed, fail-open access to the shared store. Store failures never reach
//! the request path: reads degrade to a miss and writes are dropped.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::entry::current_timestamp;
use crate::cache::{CacheEntry, CacheKey, CacheStore};
use crate::error::Result;

// == Cache Adapter ==
/// Serializes [`CacheEntry`] values in and out of a [`CacheStore`].
#[derive(Clone)]
pub struct CacheAdapter {
    store: Arc<dyn CacheStore>,
}

impl CacheAdapter {
    /// Wraps a shared store.
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    // == Get ==
    /// Returns the valid entry under `key`.
    ///
    /// Absent keys, entries whose own `stored_at + ttl` has passed, undecodable
    /// values and store failures all read as None. Logically expired or
    /// corrupt values are deleted on the way out.
    pub async fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let bytes = match self.store.get_raw(key.as_str()).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(err) => {
                warn!(key = %key, error = %err, "Cache store read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_slice::<CacheEntry>(&bytes) {
            Ok(entry) if entry.is_valid_at(current_timestamp()) => Some(entry),
            Ok(_) => {
                debug!(key = %key, "Stored entry outlived its ttl, removing");
                self.discard(key).await;
                None
            }
            Err(err) => {
                warn!(key = %key, error = %err, "Undecodable cache entry, removing");
                self.discard(key).await;
                None
            }
        }
    }

    // == Set ==
    /// Writes `entry` under `key` with the entry's own ttl as store expiry.
    ///
    /// Errors are logged here; callers treat them as best-effort and may
    /// ignore the result.
    pub async fn set(&self, key: &CacheKey, entry: &CacheEntry) -> Result<()> {
        let result = match serde_json::to_vec(entry) {
            Ok(bytes) => {
                self.store
                    .set_raw(key.as_str(), bytes, Duration::from_secs(entry.ttl_seconds))
                    .await
            }
            Err(err) => Err(err.into()),
        };

        if let Err(err) = &result {
            warn!(key = %key, error = %err, "Failed to cache response");
        }
        result
    }

    // == Delete ==
    /// Deletes every key matching `pattern`, returning 0 if the store fails.
    pub async fn delete(&self, pattern: &str) -> usize {
        match self.store.delete_matching(pattern).await {
            Ok(count) => count,
            Err(err) => {
                warn!(pattern, error = %err, "Cache store delete failed");
                0
            }
        }
    }

    // == Reachability ==
    /// Returns true if the store answers a ping.
    pub async fn is_reachable(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "Cache store ping failed");
                false
            }
        }
    }

    async fn discard(&self, key: &CacheKey) {
        if let Err(err) = self.store.delete(key.as_str()).await {
            debug!(key = %key, error = %err, "Could not remove stale entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::error::ProxyError;
    use async_trait::async_trait;
    use axum::http::Method;
    use bytes::Bytes;
    use tokio_test::{assert_err, assert_ok};

    /// Store that fails every call.
    struct DownStore;

    #[async_trait]
    impl CacheStore for DownStore {
        async fn get_raw(&self, _key: &str) -> Result<Option<Vec<u8>>> {
            Err(ProxyError::CacheStoreUnavailable("connection refused".into()))
        }
        async fn set_raw(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<()> {
            Err(ProxyError::CacheStoreUnavailable("connection refused".into()))
        }
        async fn delete(&self, _key: &str) -> Result<bool> {
            Err(ProxyError::CacheStoreUnavailable("connection refused".into()))
        }
        async fn delete_matching(&self, _pattern: &str) -> Result<usize> {
            Err(ProxyError::CacheStoreUnavailable("connection refused".into()))
        }
        async fn ping(&self) -> Result<()> {
            Err(ProxyError::CacheStoreUnavailable("connection refused".into()))
        }
    }

    fn entry(ttl_seconds: u64) -> CacheEntry {
        CacheEntry::new(
            Bytes::from_static(b"<h1>hi</h1>"),
            vec![("content-type".into(), "text/html".into())],
            200,
            ttl_seconds,
        )
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let adapter = CacheAdapter::new(Arc::new(MemoryStore::new(10)));
        let key = CacheKey::new(&Method::GET, "/index.html");
        let stored = entry(3600);

        assert_ok!(adapter.set(&key, &stored).await);
        assert_eq!(adapter.get(&key).await, Some(stored));
    }

    #[tokio::test]
    async fn test_logically_expired_entry_is_miss_and_deleted() {
        let store = Arc::new(MemoryStore::new(10));
        let adapter = CacheAdapter::new(store.clone());
        let key = CacheKey::new(&Method::GET, "/index.html");

        // Store still holds the key, but the entry's own clock says it expired
        let mut stale = entry(60);
        stale.stored_at -= 120;
        store
            .set_raw(
                key.as_str(),
                serde_json::to_vec(&stale).unwrap(),
                Duration::from_secs(3600),
            )
            .await
            .unwrap();

        assert!(adapter.get(&key).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_stale_key_with_wildcard_removes_only_itself() {
        let store = Arc::new(MemoryStore::new(10));
        let adapter = CacheAdapter::new(store.clone());
        for path in ["/files/a.txt", "/files/b.txt", "/files/c.txt"] {
            assert_ok!(adapter.set(&CacheKey::new(&Method::GET, path), &entry(3600)).await);
        }

        // `*` is a legal path character; the key must not act as a glob
        let key = CacheKey::new(&Method::GET, "/files/*");
        let mut stale = entry(60);
        stale.stored_at -= 120;
        store
            .set_raw(
                key.as_str(),
                serde_json::to_vec(&stale).unwrap(),
                Duration::from_secs(3600),
            )
            .await
            .unwrap();

        assert!(adapter.get(&key).await.is_none());
        assert_eq!(store.len().await, 3);
        assert!(adapter
            .get(&CacheKey::new(&Method::GET, "/files/b.txt"))
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_corrupt_value_is_miss_and_deleted() {
        let store = Arc::new(MemoryStore::new(10));
        let adapter = CacheAdapter::new(store.clone());
        let key = CacheKey::new(&Method::GET, "/broken");

        store
            .set_raw(key.as_str(), b"not json".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        assert!(adapter.get(&key).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_unreachable_store_fails_open() {
        let adapter = CacheAdapter::new(Arc::new(DownStore));
        let key = CacheKey::new(&Method::GET, "/index.html");

        assert!(adapter.get(&key).await.is_none());
        assert_err!(adapter.set(&key, &entry(60)).await);
        assert_eq!(adapter.delete("content:*").await, 0);
        assert!(!adapter.is_reachable().await);
    }

    #[tokio::test]
    async fn test_delete_by_prefix() {
        let adapter = CacheAdapter::new(Arc::new(MemoryStore::new(10)));
        for path in ["/static/a.css", "/static/b.css", "/index.html"] {
            adapter
                .set(&CacheKey::new(&Method::GET, path), &entry(60))
                .await
                .unwrap();
        }

        assert_eq!(adapter.delete("content:GET:static/*").await, 2);
        assert!(adapter
            .get(&CacheKey::new(&Method::GET, "/index.html"))
            .await
            .is_some());
    }
}
