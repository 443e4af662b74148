use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::{info, warn};

use super::LockManager;

const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
  return redis.call("DEL", KEYS[1])
else
  return 0
end
"#;

/// Lock manager backed by a Redis-compatible server.
///
/// Acquisition is `SET key token NX PX ttl`; release is an atomic
/// compare-and-delete script so a caller never deletes a lock that has
/// since expired and been taken by someone else.
pub struct RedisLockManager {
    connection: ConnectionManager,
    release_script: redis::Script,
}

impl RedisLockManager {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .with_context(|| format!("invalid redis url for lock manager: {redis_url}"))?;
        let connection = ConnectionManager::new(client)
            .await
            .context("failed to connect lock manager to redis")?;
        Ok(Self {
            connection,
            release_script: redis::Script::new(RELEASE_SCRIPT),
        })
    }

    async fn try_set(&self, key: &str, token: &str, ttl: Duration) -> redis::RedisResult<bool> {
        let mut conn = self.connection.clone();
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(token)
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn compare_and_delete(&self, key: &str, token: &str) -> redis::RedisResult<bool> {
        let mut conn = self.connection.clone();
        let deleted: i64 = self
            .release_script
            .key(key)
            .arg(token)
            .invoke_async(&mut conn)
            .await?;
        Ok(deleted == 1)
    }
}

#[async_trait]
impl LockManager for RedisLockManager {
    async fn acquire(&self, key: &str, token: &str, ttl: Duration) -> bool {
        match self.try_set(key, token, ttl).await {
            Ok(true) => {
                info!(lock_key = key, ttl_ms = ttl.as_millis() as u64, "acquired lock");
                true
            }
            Ok(false) => {
                warn!(lock_key = key, "failed to acquire lock, possibly held by another process");
                false
            }
            Err(error) => {
                warn!(lock_key = key, error = %error, "redis error while acquiring lock");
                false
            }
        }
    }

    async fn release(&self, key: &str, token: &str) -> bool {
        match self.compare_and_delete(key, token).await {
            Ok(true) => {
                info!(lock_key = key, "released lock");
                true
            }
            Ok(false) => {
                warn!(lock_key = key, "lock not held by this token or already expired");
                false
            }
            Err(error) => {
                warn!(lock_key = key, error = %error, "redis error while releasing lock");
                false
            }
        }
    }
}
