//! Telemetry record sent to the analytics sink.

use serde::{Deserialize, Serialize};

use crate::proxy::CacheOutcome;

// == Telemetry Record ==
/// One completed request, as accepted by the analytics sink's tracking endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    /// Completion time (Unix seconds)
    pub timestamp: i64,
    pub method: String,
    pub path: String,
    #[serde(rename = "cache_status")]
    pub outcome: CacheOutcome,
    #[serde(rename = "edge_server")]
    pub edge_id: String,
    #[serde(rename = "edge_region")]
    pub region: String,
    #[serde(rename = "response_time")]
    pub response_time_ms: u64,
    #[serde(rename = "bytes_sent")]
    pub bytes_served: usize,
    #[serde(rename = "client_ip")]
    pub client_address: String,
    pub user_agent: Option<String>,
}
