//! Cache Statistics Module
//!
//! Key census grouped by namespace prefix.

use std::collections::BTreeMap;

use serde::Serialize;

/// First key segments reported as their own bucket.
pub const PREFIX_BUCKETS: [&str; 6] = ["session", "ai", "faction", "mission", "player", "world"];

/// Bucket for keys whose first segment is not in [`PREFIX_BUCKETS`].
pub const OTHER_BUCKET: &str = "other";

// == Cache Stats ==
/// Snapshot of the keys currently held by the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Number of live keys
    pub total_keys: usize,
    /// Key count per first segment, every bucket always present
    pub keys_by_prefix: BTreeMap<String, usize>,
}

impl CacheStats {
    // == Constructor ==
    /// Creates empty stats with every bucket at zero.
    pub fn new() -> Self {
        let keys_by_prefix = PREFIX_BUCKETS
            .iter()
            .chain(std::iter::once(&OTHER_BUCKET))
            .map(|bucket| (bucket.to_string(), 0))
            .collect();
        Self {
            total_keys: 0,
            keys_by_prefix,
        }
    }

    // == From Keys ==
    /// Buckets a key listing by its first `:`-separated segment.
    pub fn from_keys<S: AsRef<str>>(keys: &[S]) -> Self {
        let mut stats = Self::new();
        for key in keys {
            stats.record_key(key.as_ref());
        }
        stats
    }

    // == Record Key ==
    pub fn record_key(&mut self, key: &str) {
        let bucket = bucket_for(key);
        *self.keys_by_prefix.entry(bucket.to_string()).or_insert(0) += 1;
        self.total_keys += 1;
    }

    /// Count for one bucket, zero when unknown.
    pub fn count(&self, bucket: &str) -> usize {
        self.keys_by_prefix.get(bucket).copied().unwrap_or(0)
    }
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new()
    }
}

fn bucket_for(key: &str) -> &'static str {
    let first = key.split(':').next().unwrap_or_default();
    PREFIX_BUCKETS
        .iter()
        .copied()
        .find(|bucket| *bucket == first)
        .unwrap_or(OTHER_BUCKET)
}
