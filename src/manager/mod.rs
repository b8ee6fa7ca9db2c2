//! Cache Manager Module
//!
//! Domain layer over a [`KeyValueStore`]: one namespace and default TTL per
//! game subsystem, JSON payloads, and bulk maintenance operations.

mod namespace;

pub use namespace::{Namespace, WORLD_STATE_ID};

use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, KeyValueStore};
use crate::error::Result;

// == Health Status ==
/// Result of a timed health probe. Always produced, never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub connected: bool,
    /// Round-trip time of the probe, when it completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthStatus {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            connected: false,
            latency_ms: None,
            error: Some(error.into()),
        }
    }
}

/// Fields of a cached mission payload inspected by
/// [`CacheManager::get_player_active_missions`]. Other fields are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MissionSnapshot {
    player_id: Option<String>,
    status: Option<String>,
    mission_id: Option<String>,
}

// == Cache Manager ==
/// Subsystem-aware cache facade.
#[derive(Clone)]
pub struct CacheManager {
    store: Arc<dyn KeyValueStore>,
}

impl CacheManager {
    // == Constructor ==
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    // == Generic Namespace Access ==
    /// Stores `data` as JSON under `namespace`, with the namespace TTL unless overridden.
    pub async fn set_in<T: Serialize + ?Sized>(
        &self,
        namespace: Namespace,
        id: &str,
        data: &T,
        ttl: Option<u64>,
    ) -> Result<bool> {
        let key = namespace.key(id);
        let payload = serde_json::to_string(data)?;
        let stored = self
            .store
            .set(&key, payload, Some(namespace.ttl_or_default(ttl)))
            .await?;
        if !stored {
            warn!("Cache refused write for '{}'", key);
        }
        Ok(stored)
    }

    /// Loads and decodes a JSON payload. Undecodable payloads count as a miss.
    pub async fn get_in<T: DeserializeOwned>(
        &self,
        namespace: Namespace,
        id: &str,
    ) -> Result<Option<T>> {
        let key = namespace.key(id);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Discarding undecodable cache entry '{}': {}", key, e);
                Ok(None)
            }
        }
    }

    /// Removes the key for `id`, reporting whether anything was removed.
    pub async fn delete_in(&self, namespace: Namespace, id: &str) -> Result<bool> {
        Ok(self.store.del(&namespace.key(id)).await? > 0)
    }

    /// Writes several entries of one namespace in a single batch. Batched
    /// entries carry no TTL.
    pub async fn set_many<T: Serialize>(
        &self,
        namespace: Namespace,
        entries: &[(&str, T)],
    ) -> Result<()> {
        let pairs = entries
            .iter()
            .map(|(id, data)| -> Result<(String, String)> {
                Ok((namespace.key(id), serde_json::to_string(data)?))
            })
            .collect::<Result<Vec<_>>>()?;
        self.store.mset(&pairs).await
    }

    // == User Sessions ==
    pub async fn set_user_session<T: Serialize + ?Sized>(
        &self,
        user_id: &str,
        data: &T,
        ttl: Option<u64>,
    ) -> Result<bool> {
        self.set_in(Namespace::UserSession, user_id, data, ttl).await
    }

    pub async fn get_user_session<T: DeserializeOwned>(&self, user_id: &str) -> Result<Option<T>> {
        self.get_in(Namespace::UserSession, user_id).await
    }

    pub async fn delete_user_session(&self, user_id: &str) -> Result<bool> {
        self.delete_in(Namespace::UserSession, user_id).await
    }

    // == AI Memory ==
    pub async fn set_ai_memory<T: Serialize + ?Sized>(
        &self,
        agent_id: &str,
        data: &T,
        ttl: Option<u64>,
    ) -> Result<bool> {
        self.set_in(Namespace::AiMemory, agent_id, data, ttl).await
    }

    pub async fn get_ai_memory<T: DeserializeOwned>(&self, agent_id: &str) -> Result<Option<T>> {
        self.get_in(Namespace::AiMemory, agent_id).await
    }

    pub async fn delete_ai_memory(&self, agent_id: &str) -> Result<bool> {
        self.delete_in(Namespace::AiMemory, agent_id).await
    }

    // == Faction State ==
    pub async fn set_faction_state<T: Serialize + ?Sized>(
        &self,
        faction_id: &str,
        data: &T,
        ttl: Option<u64>,
    ) -> Result<bool> {
        self.set_in(Namespace::FactionState, faction_id, data, ttl).await
    }

    pub async fn get_faction_state<T: DeserializeOwned>(
        &self,
        faction_id: &str,
    ) -> Result<Option<T>> {
        self.get_in(Namespace::FactionState, faction_id).await
    }

    pub async fn delete_faction_state(&self, faction_id: &str) -> Result<bool> {
        self.delete_in(Namespace::FactionState, faction_id).await
    }

    // == Missions ==
    pub async fn cache_mission<T: Serialize + ?Sized>(
        &self,
        mission_id: &str,
        data: &T,
        ttl: Option<u64>,
    ) -> Result<bool> {
        self.set_in(Namespace::MissionCache, mission_id, data, ttl).await
    }

    pub async fn get_cached_mission<T: DeserializeOwned>(
        &self,
        mission_id: &str,
    ) -> Result<Option<T>> {
        self.get_in(Namespace::MissionCache, mission_id).await
    }

    pub async fn delete_cached_mission(&self, mission_id: &str) -> Result<bool> {
        self.delete_in(Namespace::MissionCache, mission_id).await
    }

    /// Ids of cached missions owned by `player_id` whose status is `active`.
    ///
    /// Scans every `mission:cache:*` key and filters locally, so cost grows
    /// with the total number of cached missions.
    pub async fn get_player_active_missions(&self, player_id: &str) -> Result<Vec<String>> {
        let keys = self.store.keys(&Namespace::MissionCache.pattern()).await?;
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let values = self.store.mget(&keys).await?;

        let missions = keys
            .iter()
            .zip(values)
            .filter_map(|(key, raw)| {
                let raw = raw?;
                match serde_json::from_str::<MissionSnapshot>(&raw) {
                    Ok(snapshot) => Some(snapshot),
                    Err(e) => {
                        debug!("Skipping unparsable mission entry '{}': {}", key, e);
                        None
                    }
                }
            })
            .filter(|mission| {
                mission.player_id.as_deref() == Some(player_id)
                    && mission.status.as_deref() == Some("active")
            })
            .filter_map(|mission| mission.mission_id)
            .collect();
        Ok(missions)
    }

    // == Player Stats ==
    pub async fn set_player_stats<T: Serialize + ?Sized>(
        &self,
        player_id: &str,
        data: &T,
        ttl: Option<u64>,
    ) -> Result<bool> {
        self.set_in(Namespace::PlayerStats, player_id, data, ttl).await
    }

    pub async fn get_player_stats<T: DeserializeOwned>(
        &self,
        player_id: &str,
    ) -> Result<Option<T>> {
        self.get_in(Namespace::PlayerStats, player_id).await
    }

    pub async fn delete_player_stats(&self, player_id: &str) -> Result<bool> {
        self.delete_in(Namespace::PlayerStats, player_id).await
    }

    // == World State ==
    pub async fn set_world_state<T: Serialize + ?Sized>(
        &self,
        data: &T,
        ttl: Option<u64>,
    ) -> Result<bool> {
        self.set_in(Namespace::WorldState, WORLD_STATE_ID, data, ttl).await
    }

    pub async fn get_world_state<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        self.get_in(Namespace::WorldState, WORLD_STATE_ID).await
    }

    pub async fn delete_world_state(&self) -> Result<bool> {
        self.delete_in(Namespace::WorldState, WORLD_STATE_ID).await
    }

    // == Temporary Data ==
    pub async fn set_temporary<T: Serialize + ?Sized>(
        &self,
        id: &str,
        data: &T,
        ttl: Option<u64>,
    ) -> Result<bool> {
        self.set_in(Namespace::Temporary, id, data, ttl).await
    }

    pub async fn get_temporary<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>> {
        self.get_in(Namespace::Temporary, id).await
    }

    pub async fn delete_temporary(&self, id: &str) -> Result<bool> {
        self.delete_in(Namespace::Temporary, id).await
    }

    // == Health Check ==
    /// Times a health probe against the store. Failures are reported in the
    /// result, never returned as errors.
    pub async fn health_check(&self) -> HealthStatus {
        let started = Instant::now();
        match self.store.health_check().await {
            Ok(connected) => HealthStatus {
                connected,
                latency_ms: Some(started.elapsed().as_millis() as u64),
                error: None,
            },
            Err(e) => {
                warn!("Cache health check failed: {}", e);
                HealthStatus::failed(e.to_string())
            }
        }
    }

    // == Stats ==
    /// Counts every key by namespace prefix.
    pub async fn get_cache_stats(&self) -> Result<CacheStats> {
        let keys = self.store.keys("*").await?;
        Ok(CacheStats::from_keys(&keys))
    }

    // == Cleanup ==
    /// Removes the session and player stats of `user_id`. Returns the number
    /// of keys removed.
    pub async fn clear_user_data(&self, user_id: &str) -> Result<u64> {
        let mut removed = self
            .delete_matching(&Namespace::UserSession.id_pattern(user_id))
            .await?;
        removed += self
            .delete_matching(&Namespace::PlayerStats.id_pattern(user_id))
            .await?;
        info!("Cleared {} cache keys for user {}", removed, user_id);
        Ok(removed)
    }

    /// Removes the cached state of `faction_id`.
    pub async fn clear_faction_data(&self, faction_id: &str) -> Result<u64> {
        let removed = self
            .delete_matching(&Namespace::FactionState.id_pattern(faction_id))
            .await?;
        info!("Cleared {} cache keys for faction {}", removed, faction_id);
        Ok(removed)
    }

    /// Removes every `temp:*` key.
    pub async fn flush_temporary(&self) -> Result<u64> {
        let removed = self.delete_matching(&Namespace::Temporary.pattern()).await?;
        if removed > 0 {
            info!("Flushed {} temporary cache keys", removed);
        } else {
            debug!("No temporary cache keys to flush");
        }
        Ok(removed)
    }

    async fn delete_matching(&self, pattern: &str) -> Result<u64> {
        let keys = self.store.keys(pattern).await?;
        let mut removed = 0;
        for key in &keys {
            removed += self.store.del(key).await?;
        }
        Ok(removed)
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("store", &self.store.backend())
            .finish()
    }
}
