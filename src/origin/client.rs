//! Origin Client
//!
//! Upstream fetches with a fixed deadline. A timeout or transport failure is
//! returned as an error; the caller never sees a partial response.

use std::time::Duration;

use axum::http::{header, HeaderMap, Method, StatusCode};
use bytes::Bytes;
use tracing::debug;

use crate::config::{Config, EdgeIdentity};
use crate::error::{ProxyError, Result};
use crate::origin::headers::{collapse_response_headers, outbound_headers};

// == Origin Response ==
/// A fully buffered origin response.
#[derive(Debug, Clone)]
pub struct OriginResponse {
    pub status: StatusCode,
    /// Response headers, first value per name, hop-by-hop removed
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl OriginResponse {
    /// Declared content type, or "" if absent.
    pub fn content_type(&self) -> &str {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(header::CONTENT_TYPE.as_str()))
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }

    /// True for statuses in [200, 400), the only ones that get cached.
    pub fn is_cacheable_status(&self) -> bool {
        self.status.is_success() || self.status.is_redirection()
    }
}

// == Origin Client ==
/// HTTP client for the origin content service.
#[derive(Debug, Clone)]
pub struct OriginClient {
    client: reqwest::Client,
    base_url: String,
    identity: EdgeIdentity,
    timeout: Duration,
    probe_timeout: Duration,
}

impl OriginClient {
    /// Creates a client for the origin at `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        identity: EdgeIdentity,
        timeout: Duration,
        probe_timeout: Duration,
    ) -> Result<Self> {
        // Redirects are the client's business, not ours
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|err| ProxyError::Internal(format!("origin client: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            identity,
            timeout,
            probe_timeout,
        })
    }

    /// Creates a client from the edge configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.origin_url.clone(),
            config.identity(),
            config.origin_timeout(),
            config.health_probe_timeout(),
        )
    }

    /// Origin base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // == Fetch ==
    /// Forwards a request to origin and buffers the full response.
    ///
    /// `path` may carry a query string. Edge identification and the
    /// forwarded-for chain are added to the outbound headers.
    pub async fn fetch(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        body: Bytes,
        client_addr: Option<&str>,
    ) -> Result<OriginResponse> {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, url = %url, "Fetching from origin");

        let response = self
            .client
            .request(method.clone(), &url)
            .headers(outbound_headers(headers, &self.identity, client_addr))
            .body(body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| self.classify(err))?;

        let status = response.status();
        let headers = collapse_response_headers(response.headers(), *method == Method::HEAD);
        let body = response.bytes().await.map_err(|err| self.classify(err))?;

        Ok(OriginResponse {
            status,
            headers,
            body,
        })
    }

    // == Probe ==
    /// Returns true if `GET {origin}/health` answers 200 within the probe timeout.
    pub async fn probe(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => response.status() == StatusCode::OK,
            Err(err) => {
                debug!(error = %err, "Origin health probe failed");
                false
            }
        }
    }

    fn classify(&self, err: reqwest::Error) -> ProxyError {
        if err.is_timeout() {
            ProxyError::OriginTimeout(self.timeout)
        } else {
            ProxyError::from(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> OriginResponse {
        OriginResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers: vec![("content-type".into(), "text/css".into())],
            body: Bytes::new(),
        }
    }

    #[test]
    fn test_cacheable_status_range() {
        assert!(response(200).is_cacheable_status());
        assert!(response(204).is_cacheable_status());
        assert!(response(301).is_cacheable_status());
        assert!(response(304).is_cacheable_status());
        assert!(!response(199).is_cacheable_status());
        assert!(!response(404).is_cacheable_status());
        assert!(!response(500).is_cacheable_status());
    }

    #[test]
    fn test_content_type_lookup() {
        assert_eq!(response(200).content_type(), "text/css");
        let mut bare = response(200);
        bare.headers.clear();
        assert_eq!(bare.content_type(), "");
    }

    #[tokio::test]
    async fn test_connection_refused_is_origin_failure() {
        // Port 9 on loopback is the discard port and is normally closed
        let client = OriginClient::new(
            "http://127.0.0.1:9",
            EdgeIdentity::new("edge-1", "us-east-1"),
            Duration::from_secs(2),
            Duration::from_secs(1),
        )
        .unwrap();

        let result = client
            .fetch(&Method::GET, "/index.html", &HeaderMap::new(), Bytes::new(), None)
            .await;

        assert!(result.unwrap_err().is_origin_failure());
        assert!(!client.probe().await);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = OriginClient::new(
            "http://origin:3000/",
            EdgeIdentity::new("e", "r"),
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://origin:3000");
    }
}
