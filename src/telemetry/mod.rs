//! Telemetry Module
//!
//! Per-request outcome records and their best-effort delivery to the
//! external analytics sink.

mod emitter;
mod record;

pub use emitter::{TelemetryConfig, TelemetryEmitter};
pub use record::TelemetryRecord;
