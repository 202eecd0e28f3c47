//! Telemetry Emitter
//!
//! Fire-and-forget delivery of [`TelemetryRecord`]s. Records go into a bounded
//! queue drained by a worker task; when the queue is full the newest record is
//! dropped. Delivery failures are logged and discarded, never retried.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ProxyError, Result};
use crate::metrics::EdgeStats;
use crate::telemetry::TelemetryRecord;

/// Sink delivery settings.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Endpoint records are POSTed to
    pub endpoint: String,
    /// Per-delivery deadline
    pub timeout: Duration,
    /// Records that may wait for a delivery slot
    pub queue_capacity: usize,
    /// Concurrent deliveries
    pub max_in_flight: usize,
}

impl TelemetryConfig {
    /// Builds sink settings from the edge configuration, None if telemetry is disabled.
    pub fn from_config(config: &Config) -> Option<Self> {
        config.telemetry_url.as_ref().map(|endpoint| Self {
            endpoint: endpoint.clone(),
            timeout: config.telemetry_timeout(),
            queue_capacity: config.telemetry_queue_capacity.max(1),
            max_in_flight: config.telemetry_max_in_flight.max(1),
        })
    }
}

// == Telemetry Emitter ==
/// Cheap-to-clone handle for queueing telemetry records.
#[derive(Clone)]
pub struct TelemetryEmitter {
    tx: Option<mpsc::Sender<TelemetryRecord>>,
    stats: Arc<EdgeStats>,
}

impl TelemetryEmitter {
    /// Emitter that discards every record.
    pub fn disabled(stats: Arc<EdgeStats>) -> Self {
        Self { tx: None, stats }
    }

    /// Starts the delivery worker and returns the emitter with the worker handle.
    ///
    /// The worker exits once every emitter clone has been dropped and the
    /// queue is drained.
    pub fn spawn(config: TelemetryConfig, stats: Arc<EdgeStats>) -> Result<(Self, JoinHandle<()>)> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ProxyError::Internal(format!("telemetry client: {err}")))?;

        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let worker = DeliveryWorker {
            client,
            endpoint: config.endpoint,
            slots: Arc::new(Semaphore::new(config.max_in_flight)),
            max_in_flight: u32::try_from(config.max_in_flight).unwrap_or(u32::MAX),
        };
        let handle = tokio::spawn(worker.run(rx));

        Ok((
            Self {
                tx: Some(tx),
                stats,
            },
            handle,
        ))
    }

    /// Queues `record` for delivery without waiting.
    pub fn emit(&self, record: TelemetryRecord) {
        let Some(tx) = &self.tx else {
            return;
        };

        match tx.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(record)) => {
                self.stats.record_telemetry_dropped();
                debug!(path = %record.path, "Telemetry queue full, dropping record");
            }
            Err(TrySendError::Closed(record)) => {
                self.stats.record_telemetry_dropped();
                debug!(path = %record.path, "Telemetry worker stopped, dropping record");
            }
        }
    }

    /// Returns true if records are being delivered.
    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }
}

struct DeliveryWorker {
    client: reqwest::Client,
    endpoint: String,
    slots: Arc<Semaphore>,
    max_in_flight: u32,
}

impl DeliveryWorker {
    async fn run(self, mut rx: mpsc::Receiver<TelemetryRecord>) {
        info!(endpoint = %self.endpoint, "Telemetry delivery started");

        while let Some(record) = rx.recv().await {
            // Waiting here lets the queue absorb bursts; once it is full, emit drops
            let Ok(permit) = self.slots.clone().acquire_owned().await else {
                break;
            };
            let client = self.client.clone();
            let endpoint = self.endpoint.clone();

            tokio::spawn(async move {
                if let Err(err) = deliver(&client, &endpoint, &record).await {
                    warn!(error = %err, path = %record.path, "Failed to send analytics");
                }
                drop(permit);
            });
        }

        // Queue closed: wait for in-flight deliveries before reporting done
        let _ = self.slots.acquire_many(self.max_in_flight).await;
        debug!("Telemetry delivery stopped");
    }
}

async fn deliver(client: &reqwest::Client, endpoint: &str, record: &TelemetryRecord) -> Result<()> {
    let response = client
        .post(endpoint)
        .json(record)
        .send()
        .await
        .map_err(|err| ProxyError::TelemetrySinkUnavailable(err.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProxyError::TelemetrySinkUnavailable(format!(
            "sink answered {status}"
        )));
    }

    debug!(
        edge_id = %record.edge_id,
        outcome = %record.outcome,
        path = %record.path,
        "Analytics sent"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::CacheOutcome;

    fn record(path: &str) -> TelemetryRecord {
        TelemetryRecord {
            timestamp: 0,
            method: "GET".into(),
            path: path.into(),
            outcome: CacheOutcome::Miss,
            edge_id: "edge-1".into(),
            region: "us-east-1".into(),
            response_time_ms: 1,
            bytes_served: 10,
            client_address: "127.0.0.1".into(),
            user_agent: Some("test".into()),
        }
    }

    #[test]
    fn test_disabled_emitter_drops_silently() {
        let stats = Arc::new(EdgeStats::new());
        let emitter = TelemetryEmitter::disabled(stats.clone());

        emitter.emit(record("/a"));

        assert!(!emitter.is_enabled());
        assert_eq!(stats.snapshot().telemetry_dropped, 0);
    }

    #[tokio::test]
    async fn test_full_queue_drops_newest() {
        let stats = Arc::new(EdgeStats::new());
        // Hand-built emitter with nobody draining the queue
        let (tx, _rx) = mpsc::channel(2);
        let emitter = TelemetryEmitter {
            tx: Some(tx),
            stats: stats.clone(),
        };

        for i in 0..5 {
            emitter.emit(record(&format!("/{i}")));
        }

        assert_eq!(stats.snapshot().telemetry_dropped, 3);
    }

    #[tokio::test]
    async fn test_closed_queue_drops() {
        let stats = Arc::new(EdgeStats::new());
        let (tx, rx) = mpsc::channel(2);
        drop(rx);
        let emitter = TelemetryEmitter {
            tx: Some(tx),
            stats: stats.clone(),
        };

        emitter.emit(record("/a"));
        assert_eq!(stats.snapshot().telemetry_dropped, 1);
    }

    #[tokio::test]
    async fn test_unreachable_sink_does_not_block_emit() {
        let stats = Arc::new(EdgeStats::new());
        let config = TelemetryConfig {
            // Reserved TEST-NET address, nothing listens there
            endpoint: "http://192.0.2.1:9/track".into(),
            timeout: Duration::from_millis(100),
            queue_capacity: 4,
            max_in_flight: 1,
        };
        let (emitter, handle) = TelemetryEmitter::spawn(config, stats).unwrap();

        let started = std::time::Instant::now();
        for i in 0..50 {
            emitter.emit(record(&format!("/{i}")));
        }
        assert!(started.elapsed() < Duration::from_millis(50));

        handle.abort();
    }
}
