//! Cache Key Module
//!
//! Derives store keys from the request method and path.

use std::fmt;

use axum::http::Method;

/// Namespace prefix shared by every content key.
pub const KEY_PREFIX: &str = "content";

// == Cache Key ==
/// Store key for a cacheable request.
///
/// Format: `content:{METHOD}:{path}` with the leading `/` removed. Keys are
/// case-sensitive and trailing slashes are kept as-is, so `/a` and `/a/` are
/// distinct entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for `method` + `path`, ignoring any query string.
    pub fn new(method: &Method, path: &str) -> Self {
        let clean_path = path.strip_prefix('/').unwrap_or(path);
        Self(format!("{}:{}:{}", KEY_PREFIX, method.as_str(), clean_path))
    }

    /// Key that also distinguishes query strings, for deployments that opt in.
    pub fn with_query(method: &Method, path: &str, query: Option<&str>) -> Self {
        let mut key = Self::new(method, path);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            key.0.push('?');
            key.0.push_str(query);
        }
        key
    }

    /// Returns the key as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Methods whose responses may be served from cache.
pub fn is_cacheable_method(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        let key = CacheKey::new(&Method::GET, "/static/app.css");
        assert_eq!(key.as_str(), "content:GET:static/app.css");
    }

    #[test]
    fn test_method_separates_keys() {
        assert_ne!(
            CacheKey::new(&Method::GET, "/index.html"),
            CacheKey::new(&Method::HEAD, "/index.html")
        );
    }

    #[test]
    fn test_trailing_slash_not_normalized() {
        assert_ne!(
            CacheKey::new(&Method::GET, "/docs"),
            CacheKey::new(&Method::GET, "/docs/")
        );
    }

    #[test]
    fn test_case_sensitive() {
        assert_ne!(
            CacheKey::new(&Method::GET, "/Logo.png"),
            CacheKey::new(&Method::GET, "/logo.png")
        );
    }

    #[test]
    fn test_with_query() {
        let key = CacheKey::with_query(&Method::GET, "/search", Some("q=rust"));
        assert_eq!(key.as_str(), "content:GET:search?q=rust");

        let key = CacheKey::with_query(&Method::GET, "/search", Some(""));
        assert_eq!(key.as_str(), "content:GET:search");
    }

    #[test]
    fn test_cacheable_methods() {
        assert!(is_cacheable_method(&Method::GET));
        assert!(is_cacheable_method(&Method::HEAD));
        assert!(!is_cacheable_method(&Method::POST));
        assert!(!is_cacheable_method(&Method::PUT));
        assert!(!is_cacheable_method(&Method::DELETE));
    }
}
