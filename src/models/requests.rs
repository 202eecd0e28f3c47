//! Request DTOs for the edge proxy's own endpoints
//!
//! Defines the structure of incoming admin request bodies.

use axum::http::Method;
use serde::Deserialize;

use crate::cache::{CacheKey, MAX_KEY_LENGTH};

/// Request body for cache invalidation (POST /admin/purge)
///
/// Exactly one of the fields must be set:
/// - `pattern`: glob over raw store keys, e.g. `content:GET:static/*`
/// - `path`: request path whose GET and HEAD entries are removed
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurgeRequest {
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

impl PurgeRequest {
    /// Resolves the request into store patterns, or an error message.
    pub fn patterns(&self) -> Result<Vec<String>, String> {
        match (&self.pattern, &self.path) {
            (Some(pattern), None) => {
                if pattern.is_empty() {
                    return Err("Pattern cannot be empty".to_string());
                }
                if pattern.len() > MAX_KEY_LENGTH {
                    return Err(format!(
                        "Pattern exceeds maximum length of {} characters",
                        MAX_KEY_LENGTH
                    ));
                }
                Ok(vec![pattern.clone()])
            }
            (None, Some(path)) => {
                if !path.starts_with('/') {
                    return Err("Path must start with '/'".to_string());
                }
                Ok([Method::GET, Method::HEAD]
                    .iter()
                    .map(|method| CacheKey::new(method, path).as_str().to_string())
                    .collect())
            }
            (Some(_), Some(_)) => Err("Specify either pattern or path, not both".to_string()),
            (None, None) => Err("Either pattern or path is required".to_string()),
        }
    }
}
