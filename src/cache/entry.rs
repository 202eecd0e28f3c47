//! Cache Entry Module
//!
//! Defines a cached origin response and its logical expiry.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// == Cache Entry ==
/// A cached origin response.
///
/// Entries are immutable once written. A re-fetch produces a new entry that
/// replaces the previous one under the same key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Response body as received from origin
    #[serde(rename = "content", with = "payload_base64")]
    pub payload: Bytes,
    /// Response headers in origin order, one value per name
    pub headers: Vec<(String, String)>,
    /// Origin status code
    pub status_code: u16,
    /// Write time (Unix seconds)
    #[serde(rename = "timestamp")]
    pub stored_at: i64,
    /// Lifetime in seconds, counted from `stored_at`
    #[serde(rename = "ttl")]
    pub ttl_seconds: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    pub fn new(
        payload: Bytes,
        headers: Vec<(String, String)>,
        status_code: u16,
        ttl_seconds: u64,
    ) -> Self {
        Self {
            payload,
            headers,
            status_code,
            stored_at: current_timestamp(),
            ttl_seconds,
        }
    }

    // == Expiry ==
    /// Absolute expiry time (Unix seconds).
    pub fn expires_at(&self) -> i64 {
        self.stored_at
            .saturating_add(i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX))
    }

    /// An entry is valid iff `now` is strictly before its expiry.
    pub fn is_valid_at(&self, now: i64) -> bool {
        now < self.expires_at()
    }

    /// Checks validity against the current clock.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(current_timestamp())
    }

    /// Remaining lifetime in seconds, zero once expired.
    pub fn ttl_remaining(&self) -> u64 {
        let remaining = self.expires_at() - current_timestamp();
        u64::try_from(remaining).unwrap_or(0)
    }

    /// Looks up a stored header value by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in seconds.
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

mod payload_base64 {
    use super::*;

    pub fn serialize<S: Serializer>(payload: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(payload))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}
