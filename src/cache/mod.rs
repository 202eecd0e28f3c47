//! Cache Module
//!
//! Cache keys, entries, TTL policy and the fail-open adapter over the
//! shared key/value store, held in process or in Redis.

mod adapter;
mod entry;
mod key;
mod memory;
mod pattern;
mod redis_store;
mod store;
pub mod ttl;


// Re-export public types
pub use adapter::CacheAdapter;
pub use entry::{current_timestamp, CacheEntry};
pub use key::{is_cacheable_method, CacheKey, KEY_PREFIX};
pub use memory::MemoryStore;
pub use pattern::glob_match;
pub use redis_store::RedisStore;
pub use store::CacheStore;
pub use ttl::ttl_for;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 2048;

/// Maximum allowed stored value size in bytes
pub const MAX_VALUE_SIZE: usize = 64 * 1024 * 1024; // 64 MB
