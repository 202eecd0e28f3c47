//! Response DTOs for the edge proxy's own endpoints
//!
//! Defines the structure of outgoing JSON bodies for health, purge and errors.

use serde::{Deserialize, Serialize};

/// Reachability of a single dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyStatus {
    Healthy,
    Unhealthy,
}

impl DependencyStatus {
    pub fn from_reachable(reachable: bool) -> Self {
        if reachable {
            DependencyStatus::Healthy
        } else {
            DependencyStatus::Unhealthy
        }
    }
}

/// Overall edge status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Degraded,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` only if every dependency is
    pub status: OverallStatus,
    pub edge_id: String,
    pub region: String,
    /// Unix seconds
    pub timestamp: i64,
    /// Cache store reachability
    pub redis: DependencyStatus,
    /// Origin reachability
    pub origin: DependencyStatus,
}

impl HealthResponse {
    /// Builds a report from the two dependency checks.
    pub fn new(
        edge_id: impl Into<String>,
        region: impl Into<String>,
        store_reachable: bool,
        origin_reachable: bool,
    ) -> Self {
        let status = if store_reachable && origin_reachable {
            OverallStatus::Healthy
        } else {
            OverallStatus::Degraded
        };

        Self {
            status,
            edge_id: edge_id.into(),
            region: region.into(),
            timestamp: chrono::Utc::now().timestamp(),
            redis: DependencyStatus::from_reachable(store_reachable),
            origin: DependencyStatus::from_reachable(origin_reachable),
        }
    }
}

/// Response body for cache invalidation (POST /admin/purge)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeResponse {
    /// Patterns that were applied
    pub patterns: Vec<String>,
    /// Number of keys removed
    pub deleted: usize,
}

impl PurgeResponse {
    pub fn new(patterns: Vec<String>, deleted: usize) -> Self {
        Self { patterns, deleted }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
