//! Error types for the edge cache proxy
//!
//! Provides unified error handling using thiserror. Only origin failures are
//! ever rendered to clients, and then only as a generic gateway failure.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Message returned to clients when the origin cannot be reached.
pub const ORIGIN_FAILURE_MESSAGE: &str = "Failed to fetch from origin";

// == Proxy Error Enum ==
/// Unified error type for the edge cache proxy.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Shared cache store could not be reached or rejected the operation
    #[error("Cache store unavailable: {0}")]
    CacheStoreUnavailable(String),

    /// Origin connection failed or the response could not be read
    #[error("Origin unavailable: {0}")]
    OriginUnavailable(String),

    /// Origin did not answer within the fetch deadline
    #[error("Origin timed out after {0:?}")]
    OriginTimeout(Duration),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Cache entry could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Telemetry sink rejected or could not receive a record
    #[error("Telemetry sink unavailable: {0}")]
    TelemetrySinkUnavailable(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// Returns true for failures that surface to clients as a gateway error.
    pub fn is_origin_failure(&self) -> bool {
        matches!(
            self,
            ProxyError::OriginUnavailable(_) | ProxyError::OriginTimeout(_)
        )
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        ProxyError::OriginUnavailable(err.to_string())
    }
}

impl From<redis::RedisError> for ProxyError {
    fn from(err: redis::RedisError) -> Self {
        ProxyError::CacheStoreUnavailable(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ProxyError::OriginUnavailable(_) | ProxyError::OriginTimeout(_) => {
                (StatusCode::BAD_GATEWAY, ORIGIN_FAILURE_MESSAGE.to_string())
            }
            ProxyError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the edge cache proxy.
pub type Result<T> = std::result::Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_errors_map_to_bad_gateway() {
        let response = ProxyError::OriginTimeout(Duration::from_secs(30)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = ProxyError::OriginUnavailable("connection refused".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_origin_error_body_hides_detail() {
        let response =
            ProxyError::OriginUnavailable("dial tcp 10.0.0.5:3000: refused".into()).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();

        assert!(text.contains(ORIGIN_FAILURE_MESSAGE));
        assert!(!text.contains("10.0.0.5"));
    }

    #[test]
    fn test_invalid_request_maps_to_bad_request() {
        let response = ProxyError::InvalidRequest("empty pattern".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_redis_error_is_store_failure() {
        let err: ProxyError =
            redis::RedisError::from((redis::ErrorKind::IoError, "connection refused")).into();
        assert!(matches!(err, ProxyError::CacheStoreUnavailable(_)));
        assert!(!err.is_origin_failure());
    }

    #[test]
    fn test_is_origin_failure() {
        assert!(ProxyError::OriginTimeout(Duration::from_secs(1)).is_origin_failure());
        assert!(!ProxyError::CacheStoreUnavailable("down".into()).is_origin_failure());
    }
}
