//! Inbound request and outbound response as seen by the proxy core.

use std::net::SocketAddr;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::debug;

use super::CacheOutcome;

// == Proxy Request ==
/// A buffered inbound request.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub client_addr: Option<SocketAddr>,
}

impl ProxyRequest {
    pub fn new(method: Method, uri: &Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            headers,
            body,
            client_addr: None,
        }
    }

    /// Attaches the peer address of the inbound connection.
    pub fn with_client_addr(mut self, addr: Option<SocketAddr>) -> Self {
        self.client_addr = addr;
        self
    }

    /// Client IP as text, "" when unknown.
    pub fn client_ip(&self) -> String {
        self.client_addr
            .map(|addr| addr.ip().to_string())
            .unwrap_or_default()
    }

    pub fn user_agent(&self) -> Option<String> {
        self.headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }
}

// == Proxy Response ==
/// The final response of a proxied request with its outcome.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub outcome: CacheOutcome,
    pub status: StatusCode,
    /// Final header set, edge markers included
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl ProxyResponse {
    /// Looks up a header value by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Sets `name` to `value`, replacing any existing value.
    pub(crate) fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => debug!(header = %name, "Dropping unrepresentable header"),
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_splits_query() {
        let uri: Uri = "/search?q=edge".parse().unwrap();
        let request = ProxyRequest::new(Method::GET, &uri, HeaderMap::new(), Bytes::new());
        assert_eq!(request.path, "/search");
        assert_eq!(request.query.as_deref(), Some("q=edge"));
        assert_eq!(request.client_ip(), "");
    }

    #[test]
    fn test_client_ip_omits_port() {
        let uri: Uri = "/".parse().unwrap();
        let request = ProxyRequest::new(Method::GET, &uri, HeaderMap::new(), Bytes::new())
            .with_client_addr(Some("192.0.2.10:51234".parse().unwrap()));
        assert_eq!(request.client_ip(), "192.0.2.10");
    }

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut response = ProxyResponse {
            outcome: CacheOutcome::Miss,
            status: StatusCode::OK,
            headers: vec![("X-Cache".into(), "HIT".into())],
            body: Bytes::new(),
        };
        response.set_header("x-cache", "MISS");
        assert_eq!(response.headers.len(), 1);
        assert_eq!(response.header("X-CACHE"), Some("MISS"));
    }

    #[test]
    fn test_into_response_applies_headers() {
        let response = ProxyResponse {
            outcome: CacheOutcome::Hit,
            status: StatusCode::NOT_MODIFIED,
            headers: vec![
                ("etag".into(), "\"v1\"".into()),
                ("bad header".into(), "x".into()),
            ],
            body: Bytes::new(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(response.headers().get("etag").unwrap(), "\"v1\"");
        assert_eq!(response.headers().len(), 1);
    }

    #[test]
    fn test_into_response_keeps_head_content_length() {
        let response = ProxyResponse {
            outcome: CacheOutcome::Hit,
            status: StatusCode::OK,
            headers: vec![("content-length".into(), "42".into())],
            body: Bytes::new(),
        }
        .into_response();

        assert_eq!(response.headers().get("content-length").unwrap(), "42");
    }
}
