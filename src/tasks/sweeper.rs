//! Expiry Sweeper Task
//!
//! Background task that removes in-process cache entries at their expiry
//! instant. It sleeps until the earliest scheduled deadline and is woken early
//! whenever an earlier one is scheduled.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{current_timestamp_ms, MemoryCache};

/// Spawns the expiry sweeper for `cache`.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let memory = Arc::new(MemoryCache::new());
/// let sweeper = spawn_expiry_sweeper(memory.clone());
/// // Later, during shutdown:
/// sweeper.abort();
/// ```
pub fn spawn_expiry_sweeper(cache: Arc<MemoryCache>) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting in-process cache expiry sweeper");

        loop {
            match cache.next_deadline().await {
                Some(deadline) => {
                    let wait = Duration::from_millis(deadline.saturating_sub(current_timestamp_ms()));
                    tokio::select! {
                        _ = tokio::time::sleep(wait) => {}
                        // An earlier deadline was scheduled; recompute the wait
                        _ = cache.wakeup().notified() => continue,
                    }
                }
                None => {
                    cache.wakeup().notified().await;
                    continue;
                }
            }

            let removed = cache.purge_expired().await;
            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no live entries were due");
            }
        }
    })
}
