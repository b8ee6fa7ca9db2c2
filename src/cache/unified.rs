//! Unified Cache Module
//!
//! One interface over the network cache and the in-process cache. Calls go to
//! the network tier first and degrade to the in-process tier per call when the
//! network fails. Fallback mode skips the network tier entirely.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cache::KeyValueStore;
use crate::error::Result;

// == Cache Type ==
/// Tier currently receiving calls by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheType {
    /// Network-backed
    Redis,
    /// In-process fallback
    Memory,
}

impl CacheType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheType::Redis => "redis",
            CacheType::Memory => "memory",
        }
    }
}

impl fmt::Display for CacheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs `$call` against the in-process tier in fallback mode, otherwise
/// against the network tier and, if that fails, once more against the
/// in-process tier.
macro_rules! with_fallback {
    ($self:ident, $op:literal, $target:expr, |$store:ident| $call:expr) => {{
        if $self.is_fallback() {
            let $store: &dyn KeyValueStore = $self.memory.as_ref();
            $call.await
        } else {
            let network_result = {
                let $store: &dyn KeyValueStore = $self.network.as_ref();
                $call.await
            };
            match network_result {
                Ok(value) => Ok(value),
                Err(err) => {
                    warn!(
                        "Network cache {} failed for '{}', using in-process cache: {}",
                        $op, $target, err
                    );
                    let $store: &dyn KeyValueStore = $self.memory.as_ref();
                    $call.await
                }
            }
        }
    }};
}

// == Unified Cache ==
/// Facade routing every operation to the active tier.
pub struct UnifiedCache {
    network: Arc<dyn KeyValueStore>,
    memory: Arc<dyn KeyValueStore>,
    fallback: AtomicBool,
}

impl UnifiedCache {
    // == Constructor ==
    /// Creates a facade over both tiers, starting in fallback mode if asked.
    pub fn new(
        network: Arc<dyn KeyValueStore>,
        memory: Arc<dyn KeyValueStore>,
        fallback: bool,
    ) -> Self {
        Self {
            network,
            memory,
            fallback: AtomicBool::new(fallback),
        }
    }

    // == Mode ==
    /// Switches default routing for all subsequent calls.
    pub fn set_fallback_mode(&self, enabled: bool) {
        let previous = self.fallback.swap(enabled, Ordering::SeqCst);
        if previous != enabled {
            info!("Unified cache now routing to {}", self.cache_type());
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback.load(Ordering::SeqCst)
    }

    pub fn cache_type(&self) -> CacheType {
        if self.is_fallback() {
            CacheType::Memory
        } else {
            CacheType::Redis
        }
    }

    // == Typed Access ==
    /// Raw string value as stored.
    pub async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        KeyValueStore::get(self, key).await
    }

    /// Value decoded from JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_raw(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn set_raw(&self, key: &str, value: impl Into<String>, ttl: Option<u64>) -> Result<bool> {
        KeyValueStore::set(self, key, value.into(), ttl).await
    }

    /// Encodes `value` as JSON and stores it.
    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<u64>,
    ) -> Result<bool> {
        let payload = serde_json::to_string(value)?;
        self.set_raw(key, payload, ttl).await
    }

    /// Removes a key, reporting whether anything was removed.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.del(key).await? > 0)
    }
}

impl fmt::Debug for UnifiedCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnifiedCache")
            .field("network", &self.network.backend())
            .field("memory", &self.memory.backend())
            .field("fallback", &self.is_fallback())
            .finish()
    }
}

#[async_trait]
impl KeyValueStore for UnifiedCache {
    fn backend(&self) -> &'static str {
        self.cache_type().as_str()
    }

    async fn connect(&self) -> Result<()> {
        self.network.connect().await
    }

    async fn disconnect(&self) -> Result<()> {
        self.network.disconnect().await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        with_fallback!(self, "get", key, |store| store.get(key))
    }

    async fn set(&self, key: &str, value: String, ttl: Option<u64>) -> Result<bool> {
        with_fallback!(self, "set", key, |store| store.set(key, value.clone(), ttl))
    }

    async fn del(&self, key: &str) -> Result<u64> {
        with_fallback!(self, "del", key, |store| store.del(key))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        with_fallback!(self, "exists", key, |store| store.exists(key))
    }

    async fn expire(&self, key: &str, ttl: u64) -> Result<bool> {
        with_fallback!(self, "expire", key, |store| store.expire(key, ttl))
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        with_fallback!(self, "keys", pattern, |store| store.keys(pattern))
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        with_fallback!(self, "mget", keys.join(","), |store| store.mget(keys))
    }

    async fn mset(&self, pairs: &[(String, String)]) -> Result<()> {
        with_fallback!(self, "mset", format!("{} pairs", pairs.len()), |store| store
            .mset(pairs))
    }

    async fn health_check(&self) -> Result<bool> {
        with_fallback!(self, "health check", self.backend(), |store| store
            .health_check())
    }
}
