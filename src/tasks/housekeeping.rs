//! Housekeeping Task
//!
//! Background task that periodically flushes the temporary namespace.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::manager::CacheManager;

/// Spawns a task calling [`CacheManager::flush_temporary`] every
/// `interval_secs` seconds. Returns `None` when the interval is zero.
///
/// Failures are logged and the task keeps running.
pub fn spawn_housekeeping_task(
    manager: Arc<CacheManager>,
    interval_secs: u64,
) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        info!("Temporary cache housekeeping disabled");
        return None;
    }
    let interval = Duration::from_secs(interval_secs);

    Some(tokio::spawn(async move {
        info!(
            "Starting temporary cache housekeeping with interval of {} seconds",
            interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            if let Err(e) = manager.flush_temporary().await {
                warn!("Temporary cache housekeeping failed: {}", e);
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use serde_json::json;

    #[tokio::test]
    async fn test_zero_interval_disables_task() {
        let manager = Arc::new(CacheManager::new(Arc::new(MemoryCache::new())));
        assert!(spawn_housekeeping_task(manager, 0).is_none());
    }

    #[tokio::test]
    async fn test_housekeeping_flushes_temporary_keys() {
        let manager = Arc::new(CacheManager::new(Arc::new(MemoryCache::new())));
        manager
            .set_temporary("scratch", &json!(1), Some(3600))
            .await
            .unwrap();
        manager
            .set_user_session("u1", &json!(1), None)
            .await
            .unwrap();

        let handle = spawn_housekeeping_task(manager.clone(), 1).unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let scratch: Option<serde_json::Value> = manager.get_temporary("scratch").await.unwrap();
        assert_eq!(scratch, None);
        let session: Option<serde_json::Value> = manager.get_user_session("u1").await.unwrap();
        assert!(session.is_some());

        handle.abort();
    }
}
