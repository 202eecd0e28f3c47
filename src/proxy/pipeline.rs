//! Cache Proxy Core
//!
//! Runs a single request through lookup, hit or miss handling, population and
//! telemetry:
//!
//! ```text
//! RECEIVED -> LOOKUP -> HIT_SERVE ---------------------------------> COMPLETE
//!                    -> MISS_FETCH -> [POPULATE] -> MISS_SERVE -----> COMPLETE
//!                                  -> gateway failure (ERROR) ------> COMPLETE
//! ```
//!
//! Non-cacheable methods skip LOOKUP and POPULATE. There is no single-flight
//! coordination: concurrent misses on a cold key each fetch, and the store
//! keeps whichever write lands last.

use std::sync::Arc;
use std::time::Instant;

use axum::http::{header, StatusCode};
use bytes::Bytes;
use tracing::{error, info};

use crate::cache::{is_cacheable_method, ttl_for, CacheAdapter, CacheEntry, CacheKey};
use crate::config::EdgeIdentity;
use crate::error::{ProxyError, ORIGIN_FAILURE_MESSAGE};
use crate::metrics::EdgeStats;
use crate::models::ErrorResponse;
use crate::origin::{
    OriginClient, OriginResponse, CACHE_STATUS_HEADER, EDGE_REGION_HEADER, EDGE_SERVER_HEADER,
};
use crate::telemetry::{TelemetryEmitter, TelemetryRecord};

use super::{CacheOutcome, ProxyRequest, ProxyResponse};

// == Edge Proxy ==
/// The caching proxy. Cheap to clone; clones share the store, client,
/// counters and telemetry queue.
#[derive(Clone)]
pub struct EdgeProxy {
    identity: EdgeIdentity,
    cache: CacheAdapter,
    origin: OriginClient,
    stats: Arc<EdgeStats>,
    telemetry: TelemetryEmitter,
    include_query_in_key: bool,
}

impl EdgeProxy {
    pub fn new(
        identity: EdgeIdentity,
        cache: CacheAdapter,
        origin: OriginClient,
        stats: Arc<EdgeStats>,
        telemetry: TelemetryEmitter,
    ) -> Self {
        Self {
            identity,
            cache,
            origin,
            stats,
            telemetry,
            include_query_in_key: false,
        }
    }

    /// Makes the query string part of cache keys and origin URLs.
    pub fn with_query_in_key(mut self, enabled: bool) -> Self {
        self.include_query_in_key = enabled;
        self
    }

    pub fn identity(&self) -> &EdgeIdentity {
        &self.identity
    }

    pub fn cache(&self) -> &CacheAdapter {
        &self.cache
    }

    pub fn origin(&self) -> &OriginClient {
        &self.origin
    }

    pub fn stats(&self) -> &Arc<EdgeStats> {
        &self.stats
    }

    /// Cache key for `request` under the configured query policy.
    pub fn cache_key(&self, request: &ProxyRequest) -> CacheKey {
        if self.include_query_in_key {
            CacheKey::with_query(&request.method, &request.path, request.query.as_deref())
        } else {
            CacheKey::new(&request.method, &request.path)
        }
    }

    // == Handle ==
    /// Serves one request. Never fails: origin failures become a 502 response
    /// with outcome `Error`.
    pub async fn handle(&self, request: ProxyRequest) -> ProxyResponse {
        let started = Instant::now();
        self.stats.record_request();

        let response = if is_cacheable_method(&request.method) {
            self.serve_cacheable(&request).await
        } else {
            self.stats.record_miss();
            match self.fetch(&request).await {
                Ok(fetched) => self.serve_miss(&request, fetched),
                Err(err) => self.gateway_failure(&request, err),
            }
        };

        self.complete(&request, &response, started);
        response
    }

    async fn serve_cacheable(&self, request: &ProxyRequest) -> ProxyResponse {
        // LOOKUP
        let key = self.cache_key(request);
        if let Some(entry) = self.cache.get(&key).await {
            self.stats.record_hit();
            info!(edge_id = %self.identity.id, path = %request.path, "Cache HIT");
            return self.serve_hit(entry);
        }
        self.stats.record_miss();

        // MISS_FETCH
        let fetched = match self.fetch(request).await {
            Ok(fetched) => fetched,
            Err(err) => return self.gateway_failure(request, err),
        };

        // POPULATE
        if fetched.is_cacheable_status() {
            self.populate(&key, request, &fetched).await;
        }

        self.serve_miss(request, fetched)
    }

    async fn fetch(&self, request: &ProxyRequest) -> crate::error::Result<OriginResponse> {
        self.stats.record_origin_request();

        let target = match request.query.as_deref() {
            Some(query) if self.include_query_in_key && !query.is_empty() => {
                format!("{}?{}", request.path, query)
            }
            _ => request.path.clone(),
        };
        let client_ip = request.client_ip();
        let client_addr = Some(client_ip.as_str()).filter(|ip| !ip.is_empty());

        let result = self
            .origin
            .fetch(
                &request.method,
                &target,
                &request.headers,
                request.body.clone(),
                client_addr,
            )
            .await;

        if result.is_err() {
            self.stats.record_origin_error();
        }
        result
    }

    async fn populate(&self, key: &CacheKey, request: &ProxyRequest, fetched: &OriginResponse) {
        let ttl = ttl_for(fetched.content_type(), &request.path);
        let entry = CacheEntry::new(
            fetched.body.clone(),
            fetched.headers.clone(),
            fetched.status.as_u16(),
            ttl,
        );

        // Best-effort: the adapter already logged the failure
        if self.cache.set(key, &entry).await.is_err() {
            self.stats.record_store_write_failure();
        }
    }

    // == Serve ==
    fn serve_hit(&self, entry: CacheEntry) -> ProxyResponse {
        let status = StatusCode::from_u16(entry.status_code).unwrap_or(StatusCode::OK);
        let mut response = ProxyResponse {
            outcome: CacheOutcome::Hit,
            status,
            headers: entry.headers,
            body: entry.payload,
        };
        self.mark(&mut response, CacheOutcome::Hit);
        response
    }

    fn serve_miss(&self, request: &ProxyRequest, fetched: OriginResponse) -> ProxyResponse {
        info!(
            edge_id = %self.identity.id,
            path = %request.path,
            status = fetched.status.as_u16(),
            size = fetched.body.len(),
            "Cache MISS"
        );

        let mut response = ProxyResponse {
            outcome: CacheOutcome::Miss,
            status: fetched.status,
            headers: fetched.headers,
            body: fetched.body,
        };
        self.mark(&mut response, CacheOutcome::Miss);
        response
    }

    fn gateway_failure(&self, request: &ProxyRequest, err: ProxyError) -> ProxyResponse {
        error!(
            edge_id = %self.identity.id,
            path = %request.path,
            error = %err,
            "Error fetching from origin"
        );

        let body = serde_json::to_vec(&ErrorResponse::new(ORIGIN_FAILURE_MESSAGE))
            .unwrap_or_default();
        let mut response = ProxyResponse {
            outcome: CacheOutcome::Error,
            status: StatusCode::BAD_GATEWAY,
            headers: vec![(
                header::CONTENT_TYPE.as_str().to_string(),
                "application/json".to_string(),
            )],
            body: Bytes::from(body),
        };
        // The cache-status header only ever reads HIT or MISS
        self.mark(&mut response, CacheOutcome::Miss);
        response
    }

    /// Stamps the cache-status marker and edge identity, replacing any origin copies.
    fn mark(&self, response: &mut ProxyResponse, status: CacheOutcome) {
        response.set_header(CACHE_STATUS_HEADER, status.as_str());
        response.set_header(EDGE_SERVER_HEADER, &self.identity.id);
        response.set_header(EDGE_REGION_HEADER, &self.identity.region);
    }

    // == Complete ==
    fn complete(&self, request: &ProxyRequest, response: &ProxyResponse, started: Instant) {
        let elapsed = started.elapsed();
        self.stats.observe_response_time(elapsed);

        let bytes_served = match response.outcome {
            CacheOutcome::Error => 0,
            _ => response.body.len(),
        };

        self.telemetry.emit(TelemetryRecord {
            timestamp: crate::cache::current_timestamp(),
            method: request.method.to_string(),
            path: request.path.clone(),
            outcome: response.outcome,
            edge_id: self.identity.id.clone(),
            region: self.identity.region.clone(),
            response_time_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            bytes_served,
            client_address: request.client_ip(),
            user_agent: request.user_agent(),
        });
    }
}
