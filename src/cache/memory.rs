//! In-process Store Module
//!
//! HashMap-backed [`CacheStore`] with store-native expiry, a capacity bound
//! and glob deletion.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::pattern::{glob_match, is_literal};
use crate::cache::store::check_limits;
use crate::cache::CacheStore;
use crate::error::Result;

// == Stored Value ==
#[derive(Debug, Clone)]
struct StoredValue {
    bytes: Vec<u8>,
    /// Expiration timestamp (Unix milliseconds)
    expires_at: i64,
}

impl StoredValue {
    fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at
    }
}

// == Memory Store ==
/// In-process key/value store with per-key expiry.
///
/// Expired keys read as absent immediately and are reclaimed on access or by
/// [`cleanup_expired`](MemoryStore::cleanup_expired). When the store is full,
/// the key closest to expiry is evicted to make room.
#[derive(Debug)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, StoredValue>>,
    max_entries: usize,
    evictions: AtomicU64,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates a new store holding at most `max_entries` keys.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
            evictions: AtomicU64::new(0),
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired keys and returns how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        let now = now_ms();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, value| !value.is_expired(now));
        before - entries.len()
    }

    // == Length ==
    /// Returns the number of keys held, including expired ones not yet reclaimed.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if the store holds no keys.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Number of keys evicted for capacity since startup.
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Evicts keys until one more fits. Expired keys sort first by
    /// `expires_at`, so they go before any live key.
    fn make_room(&self, entries: &mut HashMap<String, StoredValue>, now: i64) {
        while entries.len() >= self.max_entries {
            let victim = entries
                .iter()
                .min_by_key(|(_, value)| value.expires_at)
                .map(|(key, value)| (key.clone(), value.is_expired(now)));

            match victim {
                Some((key, expired)) => {
                    entries.remove(&key);
                    if !expired {
                        self.evictions.fetch_add(1, Ordering::Relaxed);
                        debug!(key = %key, "Evicted entry closest to expiry");
                    }
                }
                None => break,
            }
        }
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = now_ms();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(value) if !value.is_expired(now) => return Ok(Some(value.bytes.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired: reclaim lazily, re-checking under the write lock in case
        // a concurrent writer replaced it
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|value| value.is_expired(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set_raw(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        check_limits(key, value.len())?;

        let now = now_ms();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let stored = StoredValue {
            bytes: value,
            expires_at: now.saturating_add(ttl_ms),
        };

        let mut entries = self.entries.write().await;
        if !entries.contains_key(key) && entries.len() >= self.max_entries {
            self.make_room(&mut entries, now);
        }
        entries.insert(key.to_string(), stored);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn delete_matching(&self, pattern: &str) -> Result<usize> {
        let mut entries = self.entries.write().await;
        if is_literal(pattern) {
            return Ok(usize::from(entries.remove(pattern).is_some()));
        }

        let before = entries.len();
        entries.retain(|key, _| !glob_match(pattern, key));
        Ok(before - entries.len())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
