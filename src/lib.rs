//! Edge Cache - A caching reverse proxy for an origin content service
//!
//! Serves cacheable requests from a shared key/value store, falls back to the
//! origin on a miss, and reports every request to an analytics sink without
//! blocking the response.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod origin;
pub mod proxy;
pub mod tasks;
pub mod telemetry;

pub use api::AppState;
pub use config::{Config, EdgeIdentity};
pub use proxy::{CacheOutcome, EdgeProxy};
pub use tasks::spawn_cleanup_task;
