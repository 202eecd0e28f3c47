//! Request and Response models for the edge proxy's own endpoints
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing health, purge and error bodies. Proxied
//! traffic is passed through untouched and has no model here.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::PurgeRequest;
pub use responses::{DependencyStatus, ErrorResponse, HealthResponse, OverallStatus, PurgeResponse};
