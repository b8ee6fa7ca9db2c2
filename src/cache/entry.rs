//! Cache Entry Module
//!
//! A value held by the in-process tier together with its expiry schedule.

use std::time::{SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// Serialized value plus the instant after which it must no longer be served.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: String,
    /// Absolute deadline in Unix milliseconds; `None` keeps the entry until removed
    pub expires_at: Option<u64>,
    /// Matches the expiry queue item that may remove this entry
    pub generation: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Builds an entry whose deadline is `ttl_seconds` from now. A TTL of zero
    /// means the entry never expires.
    pub fn new(value: String, ttl_seconds: Option<u64>, generation: u64) -> Self {
        Self {
            value,
            expires_at: expiry_from_ttl(ttl_seconds),
            generation,
        }
    }

    /// Expired once `now_ms` reaches the deadline.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        self.expires_at.is_some_and(|deadline| now_ms >= deadline)
    }
}

// == Clock ==
/// Wall clock in Unix milliseconds. A clock set before the epoch reads as 0.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since_epoch| since_epoch.as_millis() as u64)
        .unwrap_or(0)
}

/// Deadline for a TTL given in seconds, or `None` for no/zero TTL.
pub fn expiry_from_ttl(ttl_seconds: Option<u64>) -> Option<u64> {
    let ttl = ttl_seconds.filter(|ttl| *ttl > 0)?;
    Some(current_timestamp_ms().saturating_add(ttl.saturating_mul(1000)))
}
