//! Metrics Module
//!
//! Shared request counters and their Prometheus exposition.

mod prometheus;
mod stats;

pub use prometheus::PROMETHEUS_CONTENT_TYPE;
pub use stats::{EdgeStats, HistogramBucket, HistogramSnapshot, StatsSnapshot, RESPONSE_TIME_BUCKETS};
