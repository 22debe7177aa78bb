use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

/// Key/value cache collaborating with the registry.
///
/// Only the schema descriptor is stored through this seam. There is no
/// compare-and-swap and no invalidation beyond TTL: concurrent writers
/// race with last-write-wins, which is acceptable because the cached
/// value derives deterministically from immutable schema.
#[async_trait]
pub trait Datastore: Send + Sync {
    async fn exists(&self, key: &str) -> bool;
    async fn read(&self, key: &str) -> Option<String>;
    /// Store a value. A TTL of zero means the entry never expires.
    async fn write(&self, key: &str, value: String, ttl_minutes: u64);
}

struct Entry {
    payload: String,
    expires_at: Option<Instant>,
}

/// In-process datastore honoring TTLs; the default for single-process
/// deployments and tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[cfg(test)]
    fn force_expire(&self, key: &str) {
        if let Some(entry) = self.lock().get_mut(key) {
            entry.expires_at = Some(Instant::now());
        }
    }
}

#[async_trait]
impl Datastore for MemoryStore {
    async fn exists(&self, key: &str) -> bool {
        self.read(key).await.is_some()
    }

    async fn read(&self, key: &str) -> Option<String> {
        let mut entries = self.lock();
        let expired = entries
            .get(key)
            .and_then(|entry| entry.expires_at)
            .is_some_and(|deadline| deadline <= Instant::now());
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| entry.payload.clone())
    }

    async fn write(&self, key: &str, value: String, ttl_minutes: u64) {
        let expires_at = (ttl_minutes > 0)
            .then(|| Instant::now() + Duration::from_secs(ttl_minutes * 60));
        self.lock().insert(
            key.to_string(),
            Entry {
                payload: value,
                expires_at,
            },
        );
    }
}

/// Datastore that stores nothing; disables schema caching.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

#[async_trait]
impl Datastore for NullStore {
    async fn exists(&self, _key: &str) -> bool {
        false
    }

    async fn read(&self, _key: &str) -> Option<String> {
        None
    }

    async fn write(&self, _key: &str, _value: String, _ttl_minutes: u64) {}
}
