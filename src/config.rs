//! Configuration Module
//!
//! Handles loading and managing edge proxy configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Identity an edge instance stamps on responses, origin requests and telemetry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeIdentity {
    /// Edge instance id
    pub id: String,
    /// Edge region
    pub region: String,
}

impl EdgeIdentity {
    pub fn new(id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            region: region.into(),
        }
    }
}

/// Edge proxy configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Identity of this edge instance
    pub edge_id: String,
    /// Region this edge instance serves
    pub region: String,
    /// Base URL of the origin content service
    pub origin_url: String,
    /// HTTP server port
    pub server_port: u16,
    /// Redis URL of the shared cache store, None selects the in-process store
    pub redis_url: Option<String>,
    /// Telemetry sink endpoint, None disables telemetry
    pub telemetry_url: Option<String>,
    /// Origin fetch deadline in seconds
    pub origin_timeout: u64,
    /// Origin health probe deadline in seconds
    pub health_probe_timeout: u64,
    /// Per-delivery deadline to the telemetry sink in seconds
    pub telemetry_timeout: u64,
    /// Number of telemetry records that may wait for delivery
    pub telemetry_queue_capacity: usize,
    /// Number of concurrent telemetry deliveries
    pub telemetry_max_in_flight: usize,
    /// Maximum number of entries the in-process store holds
    pub cache_max_entries: usize,
    /// Background expiry sweep interval in seconds
    pub cleanup_interval: u64,
    /// Whether the query string takes part in cache keys and origin URLs
    pub include_query_in_key: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `EDGE_ID` - Edge identity (default: edge-1)
    /// - `REGION` - Edge region (default: us-east-1)
    /// - `ORIGIN_URL` - Origin base URL (default: http://localhost:3000)
    /// - `PORT` - HTTP server port (default: 8080)
    /// - `REDIS_URL` - Shared cache store, empty uses the in-process store (default: unset)
    /// - `TELEMETRY_URL` - Telemetry sink, empty disables (default: http://analytics-service:5000/track)
    /// - `ORIGIN_TIMEOUT_SECS` - Origin fetch deadline (default: 30)
    /// - `HEALTH_PROBE_TIMEOUT_SECS` - Origin probe deadline (default: 5)
    /// - `TELEMETRY_TIMEOUT_SECS` - Sink delivery deadline (default: 5)
    /// - `TELEMETRY_QUEUE_CAPACITY` - Pending telemetry records (default: 1024)
    /// - `TELEMETRY_MAX_IN_FLIGHT` - Concurrent sink deliveries (default: 32)
    /// - `CACHE_MAX_ENTRIES` - Store capacity (default: 10000)
    /// - `CLEANUP_INTERVAL` - Expiry sweep frequency in seconds (default: 30)
    /// - `CACHE_KEY_INCLUDE_QUERY` - Key on query strings too (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let telemetry_url = match env::var("TELEMETRY_URL") {
            Ok(url) if url.trim().is_empty() => None,
            Ok(url) => Some(url),
            Err(_) => defaults.telemetry_url.clone(),
        };

        Self {
            edge_id: string_var("EDGE_ID", &defaults.edge_id),
            region: string_var("REGION", &defaults.region),
            origin_url: string_var("ORIGIN_URL", &defaults.origin_url)
                .trim_end_matches('/')
                .to_string(),
            server_port: parsed_var("PORT", defaults.server_port),
            redis_url: optional_var("REDIS_URL"),
            telemetry_url,
            origin_timeout: parsed_var("ORIGIN_TIMEOUT_SECS", defaults.origin_timeout),
            health_probe_timeout: parsed_var(
                "HEALTH_PROBE_TIMEOUT_SECS",
                defaults.health_probe_timeout,
            ),
            telemetry_timeout: parsed_var("TELEMETRY_TIMEOUT_SECS", defaults.telemetry_timeout),
            telemetry_queue_capacity: parsed_var(
                "TELEMETRY_QUEUE_CAPACITY",
                defaults.telemetry_queue_capacity,
            ),
            telemetry_max_in_flight: parsed_var(
                "TELEMETRY_MAX_IN_FLIGHT",
                defaults.telemetry_max_in_flight,
            ),
            cache_max_entries: parsed_var("CACHE_MAX_ENTRIES", defaults.cache_max_entries),
            cleanup_interval: parsed_var("CLEANUP_INTERVAL", defaults.cleanup_interval),
            include_query_in_key: parsed_var(
                "CACHE_KEY_INCLUDE_QUERY",
                defaults.include_query_in_key,
            ),
        }
    }

    /// Identity of this edge instance.
    pub fn identity(&self) -> EdgeIdentity {
        EdgeIdentity::new(&self.edge_id, &self.region)
    }

    /// Origin fetch deadline.
    pub fn origin_timeout(&self) -> Duration {
        Duration::from_secs(self.origin_timeout)
    }

    /// Origin health probe deadline.
    pub fn health_probe_timeout(&self) -> Duration {
        Duration::from_secs(self.health_probe_timeout)
    }

    /// Telemetry delivery deadline.
    pub fn telemetry_timeout(&self) -> Duration {
        Duration::from_secs(self.telemetry_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            edge_id: "edge-1".to_string(),
            region: "us-east-1".to_string(),
            origin_url: "http://localhost:3000".to_string(),
            server_port: 8080,
            redis_url: None,
            telemetry_url: Some("http://analytics-service:5000/track".to_string()),
            origin_timeout: 30,
            health_probe_timeout: 5,
            telemetry_timeout: 5,
            telemetry_queue_capacity: 1024,
            telemetry_max_in_flight: 32,
            cache_max_entries: 10_000,
            cleanup_interval: 30,
            include_query_in_key: false,
        }
    }
}

fn string_var(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => parse_or_default(name, &raw, default),
        Err(_) => default,
    }
}

/// Parses `raw`, warning and keeping `default` when it is not a valid `T`.
fn parse_or_default<T: FromStr>(name: &str, raw: &str, default: T) -> T {
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!("Invalid value {:?} for {}, using default", raw, name);
            default
        }
    }
}
