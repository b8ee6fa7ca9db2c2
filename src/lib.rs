//! GangGPT Cache - Unified cache layer for the game backend
//!
//! Redis-backed caching with automatic per-call fallback to an in-process
//! store, plus fixed key namespaces and TTLs for each game subsystem.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod manager;
pub mod models;
pub mod provider;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheType, KeyValueStore, MemoryCache, RedisStore, UnifiedCache};
pub use config::Config;
pub use error::{CacheError, Result};
pub use manager::{CacheManager, HealthStatus, Namespace};
pub use provider::{CacheProvider, Lifecycle, ProviderStats};
pub use tasks::{spawn_expiry_sweeper, spawn_housekeeping_task};
