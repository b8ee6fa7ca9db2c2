//! Cache Provider Module
//!
//! Owns the cache tiers for the lifetime of the process: builds them lazily,
//! decides between network and fallback mode at startup, and tears the
//! network connection down on shutdown.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::cache::{CacheStats, CacheType, KeyValueStore, MemoryCache, RedisStore, UnifiedCache};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::manager::{CacheManager, HealthStatus};
use crate::tasks::spawn_expiry_sweeper;

// == Lifecycle ==
/// Provider lifecycle. `Network` and `Fallback` both count as initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Network,
    Fallback,
}

impl Lifecycle {
    pub fn is_initialized(&self) -> bool {
        matches!(self, Lifecycle::Network | Lifecycle::Fallback)
    }
}

#[derive(Debug)]
struct ProviderState {
    lifecycle: Lifecycle,
    sweeper: Option<JoinHandle<()>>,
}

// == Provider Stats ==
/// Key census plus provider status.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStats {
    pub initialized: bool,
    pub backend: CacheType,
    #[serde(flatten)]
    pub cache: CacheStats,
}

// == Cache Provider ==
/// Process-wide owner of the cache tiers, shared as `Arc<CacheProvider>`.
pub struct CacheProvider {
    config: Config,
    redis: OnceCell<Arc<RedisStore>>,
    memory: OnceCell<Arc<MemoryCache>>,
    cache: OnceCell<Arc<UnifiedCache>>,
    manager: OnceCell<Arc<CacheManager>>,
    state: Mutex<ProviderState>,
}

impl CacheProvider {
    // == Constructor ==
    /// Creates an uninitialized provider. Nothing is built until first use.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            redis: OnceCell::new(),
            memory: OnceCell::new(),
            cache: OnceCell::new(),
            manager: OnceCell::new(),
            state: Mutex::new(ProviderState {
                lifecycle: Lifecycle::Uninitialized,
                sweeper: None,
            }),
        }
    }

    // == Accessors ==
    /// Network tier, built on first access.
    pub fn redis(&self) -> Arc<RedisStore> {
        self.redis
            .get_or_init(|| Arc::new(RedisStore::new(self.config.redis_url.clone())))
            .clone()
    }

    /// In-process tier, built on first access.
    pub fn memory(&self) -> Arc<MemoryCache> {
        self.memory
            .get_or_init(|| Arc::new(MemoryCache::new()))
            .clone()
    }

    /// Unified facade over both tiers, built on first access.
    pub fn cache(&self) -> Arc<UnifiedCache> {
        self.cache
            .get_or_init(|| {
                Arc::new(UnifiedCache::new(
                    self.redis(),
                    self.memory(),
                    self.config.force_memory,
                ))
            })
            .clone()
    }

    /// Domain manager on top of the unified facade, built on first access.
    pub fn manager(&self) -> Arc<CacheManager> {
        self.manager
            .get_or_init(|| Arc::new(CacheManager::new(self.cache())))
            .clone()
    }

    pub async fn lifecycle(&self) -> Lifecycle {
        self.state.lock().await.lifecycle
    }

    pub async fn is_initialized(&self) -> bool {
        self.lifecycle().await.is_initialized()
    }

    // == Initialize ==
    /// Connects the network tier, or settles on fallback mode when it is
    /// unreachable or disabled. Never fails: without any working tier the
    /// provider still reports itself initialized and logs the problem.
    ///
    /// Calling this again once initialized is a no-op.
    pub async fn initialize(&self) -> CacheType {
        let mut state = self.state.lock().await;
        if state.lifecycle.is_initialized() {
            info!(
                "Cache provider already initialized ({})",
                self.cache().cache_type()
            );
            return self.cache().cache_type();
        }

        let memory = self.memory();
        if state.sweeper.is_none() {
            state.sweeper = Some(spawn_expiry_sweeper(memory.clone()));
        }

        let cache = self.cache();
        if self.config.force_memory {
            info!("Network cache disabled by configuration, using in-process cache");
        } else {
            match self.connect_network().await {
                Ok(()) => {
                    cache.set_fallback_mode(false);
                    state.lifecycle = Lifecycle::Network;
                    info!("Cache provider initialized with Redis at {}", self.config.redis_url);
                    return CacheType::Redis;
                }
                Err(e) => {
                    warn!("Redis unavailable, falling back to in-process cache: {}", e);
                }
            }
        }

        cache.set_fallback_mode(true);
        state.lifecycle = Lifecycle::Fallback;
        if memory.health_check().await {
            info!("Cache provider initialized with in-process cache");
        } else {
            error!("In-process cache failed verification; caching is best-effort only");
        }
        CacheType::Memory
    }

    async fn connect_network(&self) -> Result<()> {
        let redis = self.redis();
        redis.connect().await?;
        if redis.health_check().await? {
            Ok(())
        } else {
            Err(CacheError::Connection(
                "Redis health check returned an unexpected reply".to_string(),
            ))
        }
    }

    // == Mode Override ==
    /// Explicitly reroutes the initialized provider. Leaving fallback mode
    /// does not reconnect; the network tier must already be connected.
    pub async fn set_fallback_mode(&self, enabled: bool) {
        let mut state = self.state.lock().await;
        self.cache().set_fallback_mode(enabled);
        if state.lifecycle.is_initialized() {
            state.lifecycle = if enabled {
                Lifecycle::Fallback
            } else {
                Lifecycle::Network
            };
        }
    }

    // == Disconnect ==
    /// Stops background work and closes the network connection. No-op when
    /// not initialized.
    pub async fn disconnect(&self) {
        let mut state = self.state.lock().await;
        if !state.lifecycle.is_initialized() {
            return;
        }

        if let Some(sweeper) = state.sweeper.take() {
            sweeper.abort();
        }
        if let Some(redis) = self.redis.get() {
            if let Err(e) = redis.disconnect().await {
                warn!("Error while disconnecting from Redis: {}", e);
            }
        }

        state.lifecycle = Lifecycle::Uninitialized;
        info!("Cache provider disconnected");
    }

    // == Health Check ==
    /// Probes the tier calls are currently routed to, bypassing the per-call
    /// fallback, so an unreachable network tier reports as disconnected.
    pub async fn health_check(&self) -> HealthStatus {
        let tier: Arc<dyn KeyValueStore> = match self.cache().cache_type() {
            CacheType::Redis => self.redis(),
            CacheType::Memory => self.memory(),
        };
        CacheManager::new(tier).health_check().await
    }

    // == Stats ==
    /// Key census from the manager plus provider status.
    pub async fn get_stats(&self) -> Result<ProviderStats> {
        let cache = self.manager().get_cache_stats().await?;
        Ok(ProviderStats {
            initialized: self.is_initialized().await,
            backend: self.cache().cache_type(),
            cache,
        })
    }
}

impl std::fmt::Debug for CacheProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
