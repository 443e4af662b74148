//! Distributed mutual exclusion keyed by string, with ownership tokens and TTL.
//!
//! Neither operation raises: `acquire` answers whether the caller now holds
//! the key, `release` whether the caller's token was the one deleted.

mod memory;
mod redis_lock;

use std::time::Duration;

use async_trait::async_trait;

pub use self::memory::InMemoryLockManager;
pub use self::redis_lock::RedisLockManager;

#[async_trait]
pub trait LockManager: Send + Sync {
    /// Set `key` to `token` only if absent, expiring after `ttl`.
    async fn acquire(&self, key: &str, token: &str, ttl: Duration) -> bool;

    /// Delete `key` only if it still holds `token`.
    async fn release(&self, key: &str, token: &str) -> bool;
}

/// Lock key for a job id under `prefix`.
pub fn job_lock_key(prefix: &str, job_id: &str) -> String {
    format!("{prefix}:{job_id}")
}
