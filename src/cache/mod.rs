//! Cache Module
//!
//! Cache tiers and the unified facade in front of them.
//!
//! # Tiers
//! - `RedisStore`: network cache, the default tier
//! - `MemoryCache`: in-process fallback with per-key expiry
//! - `UnifiedCache`: routes calls to either, degrading per call on failure

mod entry;
mod expiry;
mod memory;
mod pattern;
mod redis_store;
mod stats;
mod traits;
mod unified;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use expiry::ExpiryQueue;
pub use memory::MemoryCache;
pub use pattern::KeyPattern;
pub use redis_store::RedisStore;
pub use stats::{CacheStats, OTHER_BUCKET, PREFIX_BUCKETS};
pub use traits::KeyValueStore;
pub use unified::{CacheType, UnifiedCache};
