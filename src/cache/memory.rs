//! In-Process Cache Module
//!
//! Local key-value store with per-key expiry, used when the network cache is
//! unavailable. Expired entries are invisible immediately (lazy check) and are
//! removed proactively by the expiry sweeper at their deadline.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{Notify, RwLock};
use tracing::{debug, error};

use crate::cache::entry::{current_timestamp_ms, expiry_from_ttl};
use crate::cache::{CacheEntry, ExpiryQueue, KeyPattern, KeyValueStore};
use crate::error::Result;

/// Stale heap items tolerated before the expiry queue is compacted.
const COMPACTION_THRESHOLD: usize = 1024;

const HEALTH_CHECK_KEY: &str = "__health_check__";

// == Memory State ==
#[derive(Debug, Default)]
struct MemoryState {
    entries: HashMap<String, CacheEntry>,
    expiry: ExpiryQueue,
    next_generation: u64,
}

impl MemoryState {
    /// Removes `key` if it has expired. Returns true when it was removed.
    fn evict_if_expired(&mut self, key: &str, now_ms: u64) -> bool {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired_at(now_ms));
        if expired {
            self.entries.remove(key);
        }
        expired
    }

    fn live_value(&mut self, key: &str, now_ms: u64) -> Option<String> {
        if self.evict_if_expired(key, now_ms) {
            debug!("In-process cache: '{}' expired on access", key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    fn bump_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    /// Inserts or overwrites `key`. Returns true when the sweeper must wake.
    fn insert(&mut self, key: &str, value: String, ttl: Option<u64>) -> bool {
        let generation = self.bump_generation();
        let entry = CacheEntry::new(value, ttl, generation);
        let wake = match entry.expires_at {
            Some(expires_at) => self.expiry.schedule(key, expires_at, generation),
            None => false,
        };
        self.entries.insert(key.to_string(), entry);
        self.maybe_compact();
        wake
    }

    fn maybe_compact(&mut self) {
        if self.expiry.len() <= COMPACTION_THRESHOLD
            || self.expiry.len() <= self.entries.len() * 2
        {
            return;
        }
        let before = self.expiry.len();
        let entries = &self.entries;
        self.expiry.retain(|key, generation| {
            entries
                .get(key)
                .is_some_and(|entry| entry.generation == generation && entry.expires_at.is_some())
        });
        debug!(
            "In-process cache: compacted expiry queue from {} to {} items",
            before,
            self.expiry.len()
        );
    }
}

// == Memory Cache ==
/// In-process cache tier.
#[derive(Debug, Default)]
pub struct MemoryCache {
    state: RwLock<MemoryState>,
    /// Signalled whenever a new earliest deadline is scheduled
    wakeup: Notify,
}

impl MemoryCache {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Get ==
    /// Returns the value if present and not expired. Expired entries found
    /// here are removed.
    pub async fn get(&self, key: &str) -> Option<String> {
        let mut state = self.state.write().await;
        state.live_value(key, current_timestamp_ms())
    }

    // == Set ==
    /// Stores a value, replacing any previous value and schedule for the key.
    ///
    /// With a TTL the key is scheduled for removal at its expiry instant.
    pub async fn set(&self, key: &str, value: String, ttl: Option<u64>) {
        let wake = {
            let mut state = self.state.write().await;
            state.insert(key, value, ttl)
        };
        if wake {
            self.wakeup.notify_one();
        }
    }

    // == Delete ==
    /// Removes a key, returning whether a live value was present.
    pub async fn delete(&self, key: &str) -> bool {
        let mut state = self.state.write().await;
        let now = current_timestamp_ms();
        if state.evict_if_expired(key, now) {
            return false;
        }
        state.entries.remove(key).is_some()
    }

    // == Exists ==
    pub async fn exists(&self, key: &str) -> bool {
        let mut state = self.state.write().await;
        let now = current_timestamp_ms();
        !state.evict_if_expired(key, now) && state.entries.contains_key(key)
    }

    // == Expire ==
    /// Reschedules the expiry of an existing key.
    ///
    /// Returns false if the key is absent. A TTL of zero removes the key now.
    pub async fn expire(&self, key: &str, ttl: u64) -> bool {
        let wake = {
            let mut state = self.state.write().await;
            let now = current_timestamp_ms();
            if state.evict_if_expired(key, now) || !state.entries.contains_key(key) {
                return false;
            }
            if ttl == 0 {
                state.entries.remove(key);
                return true;
            }

            let generation = state.bump_generation();
            let Some(expires_at) = expiry_from_ttl(Some(ttl)) else {
                return false;
            };
            if let Some(entry) = state.entries.get_mut(key) {
                entry.expires_at = Some(expires_at);
                entry.generation = generation;
            }
            let wake = state.expiry.schedule(key, expires_at, generation);
            state.maybe_compact();
            wake
        };
        if wake {
            self.wakeup.notify_one();
        }
        true
    }

    // == Keys ==
    /// Live keys matching `pattern`, sorted.
    pub async fn matching_keys(&self, pattern: &KeyPattern) -> Vec<String> {
        let state = self.state.read().await;
        let now = current_timestamp_ms();
        let mut keys: Vec<String> = state
            .entries
            .iter()
            .filter(|(key, entry)| !entry.is_expired_at(now) && pattern.matches(key))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    // == Clear ==
    /// Drops every entry and every pending expiry.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.entries.clear();
        state.expiry.clear();
    }

    // == Health Check ==
    /// Round-trips a sentinel value. Never fails; a mismatch is logged and
    /// reported as `false`.
    pub async fn health_check(&self) -> bool {
        let probe = format!("ok:{}", current_timestamp_ms());
        self.set(HEALTH_CHECK_KEY, probe.clone(), Some(5)).await;
        let read_back = self.get(HEALTH_CHECK_KEY).await;
        self.delete(HEALTH_CHECK_KEY).await;

        let healthy = read_back.as_deref() == Some(probe.as_str());
        if !healthy {
            error!("In-process cache health check failed: sentinel value did not round-trip");
        }
        healthy
    }

    // == Expiry Sweep ==
    /// Removes every entry whose deadline has passed. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut state = self.state.write().await;
        let now = current_timestamp_ms();
        let mut removed = 0;
        while let Some((key, generation)) = state.expiry.pop_due(now) {
            let due = state
                .entries
                .get(&key)
                .is_some_and(|entry| entry.generation == generation && entry.is_expired_at(now));
            if due {
                state.entries.remove(&key);
                removed += 1;
            }
        }
        removed
    }

    /// Earliest pending deadline in Unix milliseconds.
    pub async fn next_deadline(&self) -> Option<u64> {
        self.state.read().await.expiry.next_deadline()
    }

    /// Wake-up signal for the expiry sweeper.
    pub fn wakeup(&self) -> &Notify {
        &self.wakeup
    }

    // == Length ==
    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let state = self.state.read().await;
        let now = current_timestamp_ms();
        state
            .entries
            .values()
            .filter(|entry| !entry.is_expired_at(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryCache {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(MemoryCache::get(self, key).await)
    }

    async fn set(&self, key: &str, value: String, ttl: Option<u64>) -> Result<bool> {
        MemoryCache::set(self, key, value, ttl).await;
        Ok(true)
    }

    async fn del(&self, key: &str) -> Result<u64> {
        Ok(u64::from(self.delete(key).await))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(MemoryCache::exists(self, key).await)
    }

    async fn expire(&self, key: &str, ttl: u64) -> Result<bool> {
        Ok(MemoryCache::expire(self, key, ttl).await)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let pattern = KeyPattern::new(pattern)?;
        Ok(self.matching_keys(&pattern).await)
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        let mut state = self.state.write().await;
        let now = current_timestamp_ms();
        Ok(keys.iter().map(|key| state.live_value(key, now)).collect())
    }

    async fn mset(&self, pairs: &[(String, String)]) -> Result<()> {
        let mut state = self.state.write().await;
        for (key, value) in pairs {
            state.insert(key, value.clone(), None);
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(MemoryCache::health_check(self).await)
    }
}
