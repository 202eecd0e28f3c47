//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry sweep: reclaims expired keys from the in-process store
//!
//! Telemetry delivery runs as its own worker, see
//! [`TelemetryEmitter::spawn`](crate::telemetry::TelemetryEmitter::spawn).

mod cleanup;

pub use cleanup::spawn_cleanup_task;
