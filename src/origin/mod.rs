//! Origin Module
//!
//! Client for the origin content service and the header rules applied at
//! the proxy boundary.

mod client;
pub mod headers;

pub use client::{OriginClient, OriginResponse};
pub use headers::{CACHE_STATUS_HEADER, EDGE_REGION_HEADER, EDGE_SERVER_HEADER, FORWARDED_FOR_HEADER};
