//! Redis Store Module
//!
//! Network cache tier backed by a self-healing Redis connection manager.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::AsyncCommands;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::KeyValueStore;
use crate::error::{CacheError, Result};

/// Attempts per (re)connect before giving up until the next failing call.
const CONNECT_RETRIES: usize = 2;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(1);

fn manager_config() -> ConnectionManagerConfig {
    ConnectionManagerConfig::new()
        .set_number_of_retries(CONNECT_RETRIES)
        .set_connection_timeout(Some(CONNECT_TIMEOUT))
        .set_max_delay(MAX_RETRY_DELAY)
}

// == Redis Store ==
/// Redis-backed key-value store.
///
/// Construction never touches the network; [`connect`](KeyValueStore::connect)
/// opens the connection and every other call fails with
/// [`CacheError::Connection`] until it has. Once connected, a dropped socket is
/// re-established by the connection manager: the call that hits the dead
/// socket fails and later calls run on the new connection.
pub struct RedisStore {
    url: String,
    connection: RwLock<Option<ConnectionManager>>,
}

impl RedisStore {
    // == Constructor ==
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connection: RwLock::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.read().await.is_some()
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        self.connection
            .read()
            .await
            .clone()
            .ok_or_else(|| CacheError::Connection("Redis client is not connected".to_string()))
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").field("url", &self.url).finish()
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn connect(&self) -> Result<()> {
        let mut slot = self.connection.write().await;
        if slot.is_some() {
            return Ok(());
        }
        let client = redis::Client::open(self.url.as_str()).map_err(|e| {
            CacheError::Connection(format!("Failed to create Redis client: {}", e))
        })?;
        let connection = ConnectionManager::new_with_config(client, manager_config())
            .await
            .map_err(|e| CacheError::Connection(format!("Failed to connect to Redis: {}", e)))?;
        *slot = Some(connection);
        info!("Connected to Redis at {}", self.url);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        if self.connection.write().await.take().is_some() {
            info!("Disconnected from Redis at {}", self.url);
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Option<u64>) -> Result<bool> {
        let mut conn = self.connection().await?;
        match ttl {
            Some(ttl_secs) if ttl_secs > 0 => {
                conn.set_ex::<_, _, ()>(key, value, ttl_secs).await?;
            }
            _ => {
                conn.set::<_, _, ()>(key, value).await?;
            }
        }
        Ok(true)
    }

    async fn del(&self, key: &str) -> Result<u64> {
        let mut conn = self.connection().await?;
        let removed: u64 = conn.del(key).await?;
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn expire(&self, key: &str, ttl: u64) -> Result<bool> {
        let mut conn = self.connection().await?;
        let seconds = i64::try_from(ttl).unwrap_or(i64::MAX);
        let applied: bool = conn.expire(key, seconds).await?;
        Ok(applied)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.connection().await?;
        let keys: Vec<String> = conn.keys(pattern).await?;
        debug!("[Redis] {} keys matched '{}'", keys.len(), pattern);
        Ok(keys)
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.connection().await?;
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(keys)
            .query_async(&mut conn)
            .await?;
        Ok(values)
    }

    async fn mset(&self, pairs: &[(String, String)]) -> Result<()> {
        if pairs.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection().await?;
        conn.mset::<_, _, ()>(pairs).await?;
        debug!("[Redis] Batch set {} keys", pairs.len());
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        let mut conn = self.connection().await?;
        let reply = redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(reply == "PONG")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_does_not_connect() {
        let store = RedisStore::new("redis://127.0.0.1:6379");
        assert!(!store.is_connected().await);
        assert_eq!(store.url(), "redis://127.0.0.1:6379");
    }

    #[tokio::test]
    async fn test_operations_fail_before_connect() {
        let store = RedisStore::new("redis://127.0.0.1:6379");

        let result = store.get("any").await;
        assert!(matches!(result, Err(CacheError::Connection(_))));

        let result = store.health_check().await;
        assert!(matches!(result, Err(CacheError::Connection(_))));
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_url() {
        let store = RedisStore::new("not a url");

        let result = store.connect().await;
        assert!(matches!(result, Err(CacheError::Connection(_))));
        assert!(!store.is_connected().await);
    }

    #[tokio::test]
    async fn test_empty_batches_skip_the_network() {
        let store = RedisStore::new("redis://127.0.0.1:6379");

        assert!(store.mget(&[]).await.unwrap().is_empty());
        store.mset(&[]).await.unwrap();
    }

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::watch;

    fn read_line<'a>(buf: &'a [u8], pos: &mut usize) -> Option<&'a str> {
        let rest = buf.get(*pos..)?;
        let offset = rest.windows(2).position(|w| w == b"\r\n")?;
        let line = std::str::from_utf8(&rest[..offset]).ok()?;
        *pos += offset + 2;
        Some(line)
    }

    /// Parses one RESP array-of-bulk-strings command, returning it and the
    /// number of bytes consumed.
    fn parse_command(buf: &[u8]) -> Option<(Vec<String>, usize)> {
        let mut pos = 0;
        let count: usize = read_line(buf, &mut pos)?.strip_prefix('*')?.parse().ok()?;
        let mut args = Vec::with_capacity(count);
        for _ in 0..count {
            let len: usize = read_line(buf, &mut pos)?.strip_prefix('$')?.parse().ok()?;
            let end = pos + len;
            if buf.len() < end + 2 {
                return None;
            }
            args.push(String::from_utf8_lossy(&buf[pos..end]).into_owned());
            pos = end + 2;
        }
        Some((args, pos))
    }

    /// Minimal RESP server answering PING with PONG and anything else with OK.
    /// Bumping the returned channel closes every open connection; new
    /// connections are still accepted.
    async fn spawn_stub_server() -> (String, watch::Sender<u64>, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (drop_tx, drop_rx) = watch::channel(0u64);
        let accepted = Arc::new(AtomicUsize::new(0));
        let accepted_counter = accepted.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                accepted_counter.fetch_add(1, Ordering::SeqCst);
                let mut drops = drop_rx.clone();
                drops.borrow_and_update();
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    loop {
                        tokio::select! {
                            read = socket.read(&mut chunk) => {
                                let n = match read {
                                    Ok(0) | Err(_) => return,
                                    Ok(n) => n,
                                };
                                buf.extend_from_slice(&chunk[..n]);
                                while let Some((args, used)) = parse_command(&buf) {
                                    buf.drain(..used);
                                    let is_ping = args
                                        .first()
                                        .is_some_and(|cmd| cmd.eq_ignore_ascii_case("PING"));
                                    let reply: &[u8] =
                                        if is_ping { b"+PONG\r\n" } else { b"+OK\r\n" };
                                    if socket.write_all(reply).await.is_err() {
                                        return;
                                    }
                                }
                            }
                            _ = drops.changed() => return,
                        }
                    }
                });
            }
        });

        (format!("redis://{}/", addr), drop_tx, accepted)
    }

    #[tokio::test]
    async fn test_connect_and_ping_stub_server() {
        let (url, _drops, accepted) = spawn_stub_server().await;
        let store = RedisStore::new(url);

        store.connect().await.unwrap();
        assert!(store.is_connected().await);
        assert!(store.health_check().await.unwrap());
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_connection_drop() {
        let (url, drops, accepted) = spawn_stub_server().await;
        let store = RedisStore::new(url);
        store.connect().await.unwrap();
        assert!(store.health_check().await.unwrap());

        // Server closes the socket under the client
        drops.send(1).unwrap();

        let mut recovered = false;
        for _ in 0..100 {
            let reconnected = accepted.load(Ordering::SeqCst) >= 2;
            if reconnected && matches!(store.health_check().await, Ok(true)) {
                recovered = true;
                break;
            }
            if !reconnected {
                // Surfaces the dead socket and triggers the reconnect
                let _ = store.health_check().await;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert!(recovered, "store never reconnected after the socket dropped");
        assert!(store.is_connected().await);
    }

    #[tokio::test]
    async fn test_disconnect_without_connection_is_noop() {
        let store = RedisStore::new("redis://127.0.0.1:6379");
        assert!(store.disconnect().await.is_ok());
    }
}
