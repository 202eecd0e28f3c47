//! API Module
//!
//! HTTP handlers and routing for the edge proxy.
//!
//! # Endpoints
//! - `GET /health` - Health check with per-dependency status
//! - `GET /metrics` - Prometheus exposition
//! - `GET /stats` - Counter snapshot
//! - `POST /admin/purge` - Cache invalidation
//! - everything else - Cache proxy

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
