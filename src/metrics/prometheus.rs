//! Prometheus exposition backed by `metrics-exporter-prometheus`.
//!
//! The recorder is owned by [`EdgeStats`](super::EdgeStats) rather than
//! installed globally, so every proxy instance renders its own registry.

use ::metrics::{counter, describe_counter, describe_histogram, histogram, Counter, Histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use super::stats::RESPONSE_TIME_BUCKETS;
use crate::config::EdgeIdentity;

/// Content type served by the metrics endpoint.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Registered metric handles plus the handle used to render them.
pub(crate) struct PrometheusExport {
    handle: PrometheusHandle,
    pub(crate) requests: Counter,
    pub(crate) hits: Counter,
    pub(crate) misses: Counter,
    pub(crate) origin_requests: Counter,
    pub(crate) origin_errors: Counter,
    pub(crate) store_write_failures: Counter,
    pub(crate) telemetry_dropped: Counter,
    pub(crate) response_time: Histogram,
}

impl PrometheusExport {
    /// Builds a private recorder, labelled with `identity` when given, and
    /// registers every edge metric on it.
    pub(crate) fn new(identity: Option<&EdgeIdentity>) -> Self {
        // Buckets are a non-empty constant; the fallback renders a summary
        let mut builder = PrometheusBuilder::new()
            .set_buckets(&RESPONSE_TIME_BUCKETS)
            .unwrap_or_else(|_| PrometheusBuilder::new());
        if let Some(identity) = identity {
            builder = builder
                .add_global_label("edge_id", identity.id.clone())
                .add_global_label("region", identity.region.clone());
        }

        let recorder = builder.build_recorder();
        let handle = recorder.handle();

        ::metrics::with_local_recorder(&recorder, || {
            describe_counter!(
                "edge_requests_total",
                "Total number of requests handled by edge server"
            );
            describe_counter!("edge_cache_hits_total", "Total number of cache hits");
            describe_counter!("edge_cache_misses_total", "Total number of cache misses");
            describe_counter!(
                "edge_origin_requests_total",
                "Total number of requests to origin server"
            );
            describe_counter!(
                "edge_origin_errors_total",
                "Total number of failed origin fetches"
            );
            describe_counter!(
                "edge_cache_write_failures_total",
                "Total number of cache writes dropped"
            );
            describe_counter!(
                "edge_telemetry_dropped_total",
                "Total number of telemetry records dropped before delivery"
            );
            describe_histogram!(
                "edge_response_duration_seconds",
                "Response duration in seconds"
            );

            Self {
                handle,
                requests: counter!("edge_requests_total"),
                hits: counter!("edge_cache_hits_total"),
                misses: counter!("edge_cache_misses_total"),
                origin_requests: counter!("edge_origin_requests_total"),
                origin_errors: counter!("edge_origin_errors_total"),
                store_write_failures: counter!("edge_cache_write_failures_total"),
                telemetry_dropped: counter!("edge_telemetry_dropped_total"),
                response_time: histogram!("edge_response_duration_seconds"),
            }
        })
    }

    /// Renders the registry in text exposition format.
    pub(crate) fn render(&self) -> String {
        self.handle.render()
    }
}
