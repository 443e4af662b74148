use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

use super::LockManager;

struct Entry {
    token: String,
    expires_at: Instant,
}

/// Process-local lock manager with the same contract as the Redis one.
#[derive(Default)]
pub struct InMemoryLockManager {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current owner token of `key`, if held and not expired.
    pub async fn holder(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.token.clone())
    }
}

#[async_trait]
impl LockManager for InMemoryLockManager {
    async fn acquire(&self, key: &str, token: &str, ttl: Duration) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        if let Some(existing) = entries.get(key)
            && existing.expires_at > now
        {
            warn!(lock_key = key, "failed to acquire lock, held by another owner");
            return false;
        }
        entries.insert(
            key.to_string(),
            Entry {
                token: token.to_string(),
                expires_at: now + ttl,
            },
        );
        info!(lock_key = key, ttl_ms = ttl.as_millis() as u64, "acquired lock");
        true
    }

    async fn release(&self, key: &str, token: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let owned = entries
            .get(key)
            .is_some_and(|e| e.token == token && e.expires_at > Instant::now());
        if owned {
            entries.remove(key);
            info!(lock_key = key, "released lock");
        } else {
            warn!(lock_key = key, "lock not held by this token or already expired");
        }
        owned
    }
}
