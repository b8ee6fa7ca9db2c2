//! Key-Value Store Contract
//!
//! The capability every cache tier exposes. Values travel as strings;
//! typed access goes through `serde_json` one layer up.

use async_trait::async_trait;

use crate::error::Result;

// == Key-Value Store ==
/// Shared contract for the network cache, the in-process cache and the
/// unified facade in front of both.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Short backend name used in log lines.
    fn backend(&self) -> &'static str;

    /// Establishes the backend connection. No-op for local stores.
    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    /// Releases the backend connection. No-op for local stores.
    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }

    /// Returns the raw value, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores a value. `ttl` of `None` or `Some(0)` means no expiry.
    async fn set(&self, key: &str, value: String, ttl: Option<u64>) -> Result<bool>;

    /// Removes a key, returning how many keys were removed.
    async fn del(&self, key: &str) -> Result<u64>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Resets the TTL of an existing key. Returns `false` if the key is absent.
    async fn expire(&self, key: &str, ttl: u64) -> Result<bool>;

    /// Lists live keys matching a Redis-style glob such as `temp:*`.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Fetches several keys at once, preserving order.
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>>;

    /// Stores several pairs without expiry.
    async fn mset(&self, pairs: &[(String, String)]) -> Result<()>;

    async fn health_check(&self) -> Result<bool>;
}
