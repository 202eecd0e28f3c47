//! Cache Store Module
//!
//! Contract for the shared key/value store that backs the edge cache.

use std::time::Duration;

use async_trait::async_trait;

use crate::cache::{MAX_KEY_LENGTH, MAX_VALUE_SIZE};
use crate::error::{ProxyError, Result};

// == Cache Store ==
/// A key/value store with per-key expiry.
///
/// Implementations must be safe to call from many request tasks at once.
/// Values are opaque bytes; encoding of cache entries is owned by
/// [`CacheAdapter`](crate::cache::CacheAdapter).
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the value under `key`, or None if absent or expired.
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value. The store
    /// reclaims it once `ttl` has elapsed.
    async fn set_raw(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    /// Deletes exactly `key`, returning true if it was present.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Deletes every key matching the glob `pattern` and returns the count.
    async fn delete_matching(&self, pattern: &str) -> Result<usize>;

    /// Checks that the store is reachable.
    async fn ping(&self) -> Result<()>;
}

/// Rejects keys and values outside the limits every store enforces.
pub(crate) fn check_limits(key: &str, value_len: usize) -> Result<()> {
    if key.is_empty() || key.len() > MAX_KEY_LENGTH {
        return Err(ProxyError::InvalidRequest(format!(
            "Key must be between 1 and {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    if value_len > MAX_VALUE_SIZE {
        return Err(ProxyError::InvalidRequest(format!(
            "Value exceeds maximum size of {} bytes",
            MAX_VALUE_SIZE
        )));
    }
    Ok(())
}
