//! Per-request cache outcome.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a completed request was served.
///
/// `Error` means the origin fetch failed. Cache store failures never produce
/// `Error`; they degrade to `Miss`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheOutcome {
    Hit,
    Miss,
    Error,
}

impl CacheOutcome {
    /// Wire representation, also used for the cache-status header.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOutcome::Hit => "HIT",
            CacheOutcome::Miss => "MISS",
            CacheOutcome::Error => "ERROR",
        }
    }
}

impl fmt::Display for CacheOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
