//! Edge Statistics Module
//!
//! Process-wide request counters shared by every request task.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

use super::prometheus::PrometheusExport;
use crate::config::EdgeIdentity;

/// Upper bounds (seconds) of the response-time histogram buckets.
pub const RESPONSE_TIME_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

// == Edge Stats ==
/// Concurrency-safe counter set, injected into the proxy core as `Arc<EdgeStats>`.
///
/// All counters only ever increase. Each update lands both in the atomics
/// behind [`snapshot`](EdgeStats::snapshot) and in the Prometheus registry
/// behind [`render_prometheus`](EdgeStats::render_prometheus).
pub struct EdgeStats {
    requests: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    origin_requests: AtomicU64,
    origin_errors: AtomicU64,
    store_write_failures: AtomicU64,
    telemetry_dropped: AtomicU64,
    /// Non-cumulative per-bucket counts, plus one overflow slot
    duration_buckets: [AtomicU64; RESPONSE_TIME_BUCKETS.len() + 1],
    duration_sum_micros: AtomicU64,
    exporter: PrometheusExport,
}

impl Default for EdgeStats {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeStats {
    // == Constructor ==
    /// Creates a counter set with everything at zero and unlabelled metrics.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Creates a counter set whose metrics carry `edge_id` and `region` labels.
    pub fn with_identity(identity: &EdgeIdentity) -> Self {
        Self::build(Some(identity))
    }

    fn build(identity: Option<&EdgeIdentity>) -> Self {
        Self {
            requests: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            origin_requests: AtomicU64::new(0),
            origin_errors: AtomicU64::new(0),
            store_write_failures: AtomicU64::new(0),
            telemetry_dropped: AtomicU64::new(0),
            duration_buckets: Default::default(),
            duration_sum_micros: AtomicU64::new(0),
            exporter: PrometheusExport::new(identity),
        }
    }

    /// Counts an inbound proxied request.
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.exporter.requests.increment(1);
    }

    /// Counts a response served from cache.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        self.exporter.hits.increment(1);
    }

    /// Counts a request that was not served from cache.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        self.exporter.misses.increment(1);
    }

    /// Counts an origin fetch attempt.
    pub fn record_origin_request(&self) {
        self.origin_requests.fetch_add(1, Ordering::Relaxed);
        self.exporter.origin_requests.increment(1);
    }

    /// Counts an origin fetch that failed or timed out.
    pub fn record_origin_error(&self) {
        self.origin_errors.fetch_add(1, Ordering::Relaxed);
        self.exporter.origin_errors.increment(1);
    }

    /// Counts a dropped cache write.
    pub fn record_store_write_failure(&self) {
        self.store_write_failures.fetch_add(1, Ordering::Relaxed);
        self.exporter.store_write_failures.increment(1);
    }

    /// Counts a telemetry record dropped before delivery.
    pub fn record_telemetry_dropped(&self) {
        self.telemetry_dropped.fetch_add(1, Ordering::Relaxed);
        self.exporter.telemetry_dropped.increment(1);
    }

    /// Records one response time into the histogram.
    pub fn observe_response_time(&self, elapsed: Duration) {
        let seconds = elapsed.as_secs_f64();
        let slot = RESPONSE_TIME_BUCKETS
            .iter()
            .position(|bound| seconds <= *bound)
            .unwrap_or(RESPONSE_TIME_BUCKETS.len());

        self.duration_buckets[slot].fetch_add(1, Ordering::Relaxed);
        self.exporter.response_time.record(seconds);
        self.duration_sum_micros.fetch_add(
            u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
            Ordering::Relaxed,
        );
    }

    /// Prometheus text exposition of every counter and the histogram.
    pub fn render_prometheus(&self) -> String {
        self.exporter.render()
    }

    // == Snapshot ==
    /// Point-in-time copy of all counters.
    ///
    /// Counters are read independently, so a snapshot taken under load may be
    /// off by in-flight increments.
    pub fn snapshot(&self) -> StatsSnapshot {
        let mut cumulative = 0;
        let mut buckets = Vec::with_capacity(RESPONSE_TIME_BUCKETS.len());
        for (bound, count) in RESPONSE_TIME_BUCKETS.iter().zip(&self.duration_buckets) {
            cumulative += count.load(Ordering::Relaxed);
            buckets.push(HistogramBucket {
                le: *bound,
                count: cumulative,
            });
        }
        let overflow = self.duration_buckets[RESPONSE_TIME_BUCKETS.len()].load(Ordering::Relaxed);

        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);

        StatsSnapshot {
            requests_total: self.requests.load(Ordering::Relaxed),
            cache_hits: hits,
            cache_misses: misses,
            hit_rate: hit_rate(hits, misses),
            origin_requests: self.origin_requests.load(Ordering::Relaxed),
            origin_errors: self.origin_errors.load(Ordering::Relaxed),
            store_write_failures: self.store_write_failures.load(Ordering::Relaxed),
            telemetry_dropped: self.telemetry_dropped.load(Ordering::Relaxed),
            response_time: HistogramSnapshot {
                buckets,
                count: cumulative + overflow,
                sum_seconds: self.duration_sum_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0,
            },
        }
    }
}

/// Calculates hits / (hits + misses), or 0.0 if nothing was counted.
fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

// == Snapshot Types ==
/// Serializable copy of [`EdgeStats`].
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub requests_total: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub hit_rate: f64,
    pub origin_requests: u64,
    pub origin_errors: u64,
    pub store_write_failures: u64,
    pub telemetry_dropped: u64,
    pub response_time: HistogramSnapshot,
}

/// Response-time distribution with cumulative buckets.
#[derive(Debug, Clone, Serialize)]
pub struct HistogramSnapshot {
    pub buckets: Vec<HistogramBucket>,
    pub count: u64,
    pub sum_seconds: f64,
}

/// Number of observations at or below `le` seconds.
#[derive(Debug, Clone, Serialize)]
pub struct HistogramBucket {
    pub le: f64,
    pub count: u64,
}
