//! Proxy Module
//!
//! The request state machine of the edge cache and its request/response types.

mod outcome;
mod pipeline;
mod request;

pub use outcome::CacheOutcome;
pub use pipeline::EdgeProxy;
pub use request::{ProxyRequest, ProxyResponse};
