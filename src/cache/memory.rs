use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;

use super::CacheStore;
use crate::error::CacheError;

/// Entries held when no capacity is configured
pub const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(10_000) {
    Some(capacity) => capacity,
    None => NonZeroUsize::MIN,
};

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
    #[cfg(test)]
    ttl: Duration,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-process store for single-node runs and tests.
///
/// Bounded by an LRU capacity; entries also expire after their TTL. Expired
/// entries at the cold end are dropped on every access.
pub struct MemoryStore {
    entries: Mutex<LruCache<String, Entry>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Entries currently held, live or not yet swept.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub(crate) fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.peek(key).map(|entry| entry.ttl))
    }

    fn poisoned() -> CacheError {
        CacheError::Protocol("memory store lock poisoned".into())
    }
}

fn sweep_expired(entries: &mut LruCache<String, Entry>, now: Instant) {
    while entries
        .peek_lru()
        .is_some_and(|(_, entry)| !entry.is_live(now))
    {
        entries.pop_lru();
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        let now = Instant::now();
        sweep_expired(&mut entries, now);

        let hit = entries
            .get(key)
            .map(|entry| entry.is_live(now).then(|| entry.value.clone()));
        match hit {
            Some(Some(value)) => Ok(Some(value)),
            Some(None) => {
                entries.pop(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        let now = Instant::now();
        sweep_expired(&mut entries, now);

        entries.put(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at: now + ttl,
                #[cfg(test)]
                ttl,
            },
        );
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), CacheError> {
        self.entries.lock().map_err(|_| Self::poisoned())?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn expired_entries_read_as_miss() {
        let store = MemoryStore::new();
        store.set("k", b"v", Duration::ZERO).await.unwrap();

        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_entries_are_dropped_without_being_read() {
        let store = MemoryStore::new();
        for i in 0..10_000 {
            store
                .set(&format!("gone-{i}"), b"v", Duration::ZERO)
                .await
                .unwrap();
        }

        assert!(store.get("other").await.unwrap().is_none());
        assert!(store.is_empty());

        store.set("live", b"v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn capacity_evicts_least_recently_used() {
        let store = MemoryStore::with_capacity(NonZeroUsize::new(2).unwrap());
        let ttl = Duration::from_secs(60);

        store.set("a", b"1", ttl).await.unwrap();
        store.set("b", b"2", ttl).await.unwrap();
        // Touch "a" so "b" becomes the eviction candidate.
        assert!(store.get("a").await.unwrap().is_some());
        store.set("c", b"3", ttl).await.unwrap();

        assert_eq!(store.len(), 2);
        assert!(store.get("b").await.unwrap().is_none());
        assert_eq!(store.get("a").await.unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get("c").await.unwrap(), Some(b"3".to_vec()));
    }

    #[tokio::test]
    async fn clear_all_drops_everything() {
        let store = MemoryStore::new();
        store.set("a", b"1", Duration::from_secs(60)).await.unwrap();
        store.set("b", b"2", Duration::from_secs(60)).await.unwrap();

        store.clear_all().await.unwrap();

        assert!(store.get("a").await.unwrap().is_none());
        assert!(store.get("b").await.unwrap().is_none());
    }
}
