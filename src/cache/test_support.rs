//! Test doubles for cache tiers.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::cache::{KeyValueStore, MemoryCache};
use crate::error::{CacheError, Result};

/// Store that either delegates to an in-process cache or fails every call,
/// counting calls either way.
pub(crate) struct FlakyStore {
    failing: bool,
    calls: AtomicUsize,
    inner: MemoryCache,
}

impl FlakyStore {
    pub(crate) fn healthy() -> Self {
        Self {
            failing: false,
            calls: AtomicUsize::new(0),
            inner: MemoryCache::new(),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            failing: true,
            ..Self::healthy()
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<&MemoryCache> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            Err(CacheError::Connection("Connection failed".to_string()))
        } else {
            Ok(&self.inner)
        }
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    fn backend(&self) -> &'static str {
        "flaky"
    }

    async fn connect(&self) -> Result<()> {
        self.enter().map(|_| ())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        KeyValueStore::get(self.enter()?, key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Option<u64>) -> Result<bool> {
        KeyValueStore::set(self.enter()?, key, value, ttl).await
    }

    async fn del(&self, key: &str) -> Result<u64> {
        self.enter()?.del(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        KeyValueStore::exists(self.enter()?, key).await
    }

    async fn expire(&self, key: &str, ttl: u64) -> Result<bool> {
        KeyValueStore::expire(self.enter()?, key, ttl).await
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.enter()?.keys(pattern).await
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        self.enter()?.mget(keys).await
    }

    async fn mset(&self, pairs: &[(String, String)]) -> Result<()> {
        self.enter()?.mset(pairs).await
    }

    async fn health_check(&self) -> Result<bool> {
        KeyValueStore::health_check(self.enter()?).await
    }
}
