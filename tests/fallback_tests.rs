//! Integration Tests for Network Outages
//!
//! Drives the manager over a unified cache whose network tier can be taken
//! down and brought back mid-test.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ganggpt_cache::{
    CacheError, CacheManager, CacheProvider, CacheType, Config, KeyValueStore, MemoryCache,
    Result, UnifiedCache,
};
use serde_json::{json, Value};

// == Test Doubles ==

/// Network stand-in backed by its own in-process store.
#[derive(Default)]
struct SwitchableStore {
    down: AtomicBool,
    calls: AtomicUsize,
    inner: MemoryCache,
}

impl SwitchableStore {
    fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            Err(CacheError::Connection("Connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueStore for SwitchableStore {
    fn backend(&self) -> &'static str {
        "switchable"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check()?;
        KeyValueStore::get(&self.inner, key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Option<u64>) -> Result<bool> {
        self.check()?;
        KeyValueStore::set(&self.inner, key, value, ttl).await
    }

    async fn del(&self, key: &str) -> Result<u64> {
        self.check()?;
        self.inner.del(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.check()?;
        KeyValueStore::exists(&self.inner, key).await
    }

    async fn expire(&self, key: &str, ttl: u64) -> Result<bool> {
        self.check()?;
        KeyValueStore::expire(&self.inner, key, ttl).await
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.check()?;
        self.inner.keys(pattern).await
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        self.check()?;
        self.inner.mget(keys).await
    }

    async fn mset(&self, pairs: &[(String, String)]) -> Result<()> {
        self.check()?;
        self.inner.mset(pairs).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.check()?;
        KeyValueStore::health_check(&self.inner).await
    }
}

type Harness = (
    CacheManager,
    Arc<UnifiedCache>,
    Arc<SwitchableStore>,
    Arc<MemoryCache>,
);

fn setup(fallback: bool) -> Harness {
    let network = Arc::new(SwitchableStore::default());
    let memory = Arc::new(MemoryCache::new());
    let cache = Arc::new(UnifiedCache::new(network.clone(), memory.clone(), fallback));
    (CacheManager::new(cache.clone()), cache, network, memory)
}

// == Scenarios ==

#[tokio::test]
async fn test_writes_land_in_memory_during_outage() {
    let (manager, cache, network, memory) = setup(false);

    manager
        .set_user_session("u1", &json!({ "token": "before" }), None)
        .await
        .unwrap();
    assert!(memory.is_empty().await);

    network.set_down(true);
    manager
        .set_user_session("u2", &json!({ "token": "during" }), None)
        .await
        .unwrap();

    let during: Option<Value> = manager.get_user_session("u2").await.unwrap();
    assert_eq!(during, Some(json!({ "token": "during" })));
    assert!(memory.exists("session:user:u2").await);

    // Per-call degradation never flips the mode
    assert_eq!(cache.cache_type(), CacheType::Redis);
}

#[tokio::test]
async fn test_network_recovery_resumes_routing() {
    let (manager, _cache, network, _memory) = setup(false);

    network.set_down(true);
    manager.set_temporary("scratch", &json!(1), None).await.unwrap();

    network.set_down(false);
    let calls_before = network.calls();
    manager
        .set_faction_state("f1", &json!({ "turf": 2 }), None)
        .await
        .unwrap();
    let faction: Option<Value> = manager.get_faction_state("f1").await.unwrap();

    assert_eq!(faction, Some(json!({ "turf": 2 })));
    assert_eq!(network.calls(), calls_before + 2);
}

#[tokio::test]
async fn test_fallback_mode_is_sticky() {
    let (manager, cache, network, _memory) = setup(true);

    manager.set_player_stats("p1", &json!({ "xp": 5 }), None).await.unwrap();
    let _: Option<Value> = manager.get_player_stats("p1").await.unwrap();
    manager.flush_temporary().await.unwrap();
    assert!(manager.health_check().await.connected);

    assert_eq!(network.calls(), 0);
    assert_eq!(cache.cache_type(), CacheType::Memory);
}

#[tokio::test]
async fn test_provider_health_reports_network_outage() {
    let config = Config {
        redis_url: "redis://127.0.0.1:9/".to_string(),
        ..Config::default()
    };
    let provider = CacheProvider::new(config);
    provider.initialize().await;
    provider.set_fallback_mode(false).await;

    // Data calls still degrade to the in-process tier
    let manager = provider.manager();
    manager.set_temporary("t1", &json!(1), None).await.unwrap();
    let value: Option<Value> = manager.get_temporary("t1").await.unwrap();
    assert_eq!(value, Some(json!(1)));

    // Health probes the routed tier and reports the outage
    let health = provider.health_check().await;
    assert!(!health.connected);
    assert!(health.error.is_some());

    provider.disconnect().await;
}

#[tokio::test]
async fn test_active_missions_during_outage() {
    let (manager, _cache, network, _memory) = setup(false);
    network.set_down(true);

    let missions = [
        ("m1", "p1", "active"),
        ("m2", "p1", "failed"),
        ("m3", "p2", "active"),
    ];
    for (id, player, status) in missions {
        manager
            .cache_mission(
                id,
                &json!({ "missionId": id, "playerId": player, "status": status }),
                None,
            )
            .await
            .unwrap();
    }

    let active = manager.get_player_active_missions("p1").await.unwrap();
    assert_eq!(active, vec!["m1".to_string()]);

    let stats = manager.get_cache_stats().await.unwrap();
    assert_eq!(stats.total_keys, 3);
    assert_eq!(stats.count("mission"), 3);
}
