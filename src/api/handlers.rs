//! API Handlers
//!
//! HTTP handlers for proxied traffic and the edge's own endpoints.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use tracing::info;

use crate::error::{ProxyError, Result};
use crate::metrics::{StatsSnapshot, PROMETHEUS_CONTENT_TYPE};
use crate::models::{HealthResponse, PurgeRequest, PurgeResponse};
use crate::proxy::{EdgeProxy, ProxyRequest};

/// Application state shared across all handlers.
///
/// The proxy is cheap to clone; every clone shares the same store, origin
/// client, counters and telemetry queue.
#[derive(Clone)]
pub struct AppState {
    pub proxy: EdgeProxy,
}

impl AppState {
    /// Creates a new AppState around the given proxy.
    pub fn new(proxy: EdgeProxy) -> Self {
        Self { proxy }
    }
}

/// Fallback handler: every path not reserved for the edge's own endpoints.
pub async fn proxy_handler(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = ProxyRequest::new(method, &uri, headers, body)
        .with_client_addr(connect_info.map(|ConnectInfo(addr)| addr));

    state.proxy.handle(request).await.into_response()
}

/// Handler for GET /health
///
/// Checks the cache store and probes the origin concurrently. A failed
/// check degrades the reported status; the endpoint itself always answers.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let proxy = &state.proxy;
    let (store_reachable, origin_reachable) =
        tokio::join!(proxy.cache().is_reachable(), proxy.origin().probe());

    let identity = proxy.identity();
    Json(HealthResponse::new(
        identity.id.clone(),
        identity.region.clone(),
        store_reachable,
        origin_reachable,
    ))
}

/// Handler for GET /metrics
///
/// Prometheus text exposition of the edge counters.
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = state.proxy.stats().render_prometheus();
    ([(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], body)
}

/// Handler for GET /stats
///
/// Returns the counters as JSON.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.proxy.stats().snapshot())
}

/// Handler for POST /admin/purge
///
/// Deletes cached entries by glob pattern or by request path.
pub async fn purge_handler(
    State(state): State<AppState>,
    Json(req): Json<PurgeRequest>,
) -> Result<Json<PurgeResponse>> {
    let patterns = req.patterns().map_err(ProxyError::InvalidRequest)?;

    let mut deleted = 0;
    for pattern in &patterns {
        deleted += state.proxy.cache().delete(pattern).await;
    }
    info!(?patterns, deleted, "Cache purge");

    Ok(Json(PurgeResponse::new(patterns, deleted)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheAdapter, CacheEntry, CacheKey, MemoryStore};
    use crate::config::EdgeIdentity;
    use crate::metrics::EdgeStats;
    use crate::models::{DependencyStatus, OverallStatus};
    use crate::origin::OriginClient;
    use crate::telemetry::TelemetryEmitter;
    use std::sync::Arc;
    use std::time::Duration;

    fn test_state() -> AppState {
        let identity = EdgeIdentity::new("edge-test", "local");
        let stats = Arc::new(EdgeStats::new());
        let origin = OriginClient::new(
            "http://127.0.0.1:9",
            identity.clone(),
            Duration::from_secs(1),
            Duration::from_millis(500),
        )
        .unwrap();
        let proxy = EdgeProxy::new(
            identity,
            CacheAdapter::new(Arc::new(MemoryStore::new(100))),
            origin,
            stats.clone(),
            TelemetryEmitter::disabled(stats),
        );
        AppState::new(proxy)
    }

    #[tokio::test]
    async fn test_health_reports_unreachable_origin() {
        let state = test_state();

        let Json(report) = health_handler(State(state)).await;

        assert_eq!(report.status, OverallStatus::Degraded);
        assert_eq!(report.redis, DependencyStatus::Healthy);
        assert_eq!(report.origin, DependencyStatus::Unhealthy);
        assert_eq!(report.edge_id, "edge-test");
    }

    #[tokio::test]
    async fn test_purge_handler_by_path() {
        let state = test_state();
        let key = CacheKey::new(&Method::GET, "/index.html");
        let entry = CacheEntry::new(Bytes::from_static(b"hi"), Vec::new(), 200, 60);
        state.proxy.cache().set(&key, &entry).await.unwrap();

        let req = PurgeRequest {
            path: Some("/index.html".into()),
            ..Default::default()
        };
        let Json(resp) = purge_handler(State(state.clone()), Json(req)).await.unwrap();

        assert_eq!(resp.deleted, 1);
        assert!(state.proxy.cache().get(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_purge_handler_rejects_invalid() {
        let state = test_state();
        let result = purge_handler(State(state), Json(PurgeRequest::default())).await;
        assert!(matches!(result, Err(ProxyError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state();
        let Json(snapshot) = stats_handler(State(state)).await;
        assert_eq!(snapshot.requests_total, 0);
        assert_eq!(snapshot.cache_hits, 0);
    }
}
