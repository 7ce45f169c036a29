//! Cache-aside access to the key-value cache
//!
//! Every read path goes through [`Cache::get_or_compute`] or one of its variants.
//! The cache is pure memoization: a hit decodes to exactly what the compute
//! function produced, and any cache failure falls back to computing from the
//! database.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, warn};

use crate::error::CacheError;

pub mod keys;
mod memcached;
mod memory;

pub use memcached::MemcachedStore;
pub use memory::MemoryStore;

/// Short-lived aggregates: block and transaction lists, paged listings
pub const TTL_VOLATILE: Duration = Duration::from_secs(60);
pub const TTL_SEARCH: Duration = Duration::from_secs(300);
pub const TTL_TEN_MINUTES: Duration = Duration::from_secs(600);
pub const TTL_HOUR: Duration = Duration::from_secs(3600);
pub const TTL_ACTIVITY: Duration = Duration::from_secs(2 * 3600);
/// Rarely-changing facts such as maker attribution
pub const TTL_DAY: Duration = Duration::from_secs(24 * 3600);

/// Raw key-value store behind the accessor.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// `Ok(None)` is a miss; `Err` is a transport or protocol failure.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;

    async fn clear_all(&self) -> Result<(), CacheError>;
}

/// Cache-aside accessor shared by every service
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Return the cached value under `key`, or run `compute` and cache its result.
    ///
    /// Concurrent misses on the same key each run `compute` and each write the
    /// entry; the last write wins.
    pub async fn get_or_compute<T, F, Fut>(&self, key: &str, ttl: Duration, compute: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.get_or_compute_with_ttl(key, move || async move { (compute().await, ttl) })
            .await
    }

    /// Like [`Cache::get_or_compute`], but the compute function also picks the TTL.
    pub async fn get_or_compute_with_ttl<T, F, Fut>(&self, key: &str, compute: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = (T, Duration)>,
    {
        if let Some(value) = self.lookup(key).await {
            return value;
        }

        let (value, ttl) = compute().await;
        self.store_value(key, &value, ttl);
        value
    }

    /// Fallible compute: an error is logged, the zero value is returned and
    /// nothing is cached, so the next request retries the source.
    pub async fn get_or_try_compute<T, E, F, Fut>(&self, key: &str, ttl: Duration, compute: F) -> T
    where
        T: Serialize + DeserializeOwned + Default,
        E: std::fmt::Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.lookup(key).await {
            return value;
        }

        match compute().await {
            Ok(value) => {
                self.store_value(key, &value, ttl);
                value
            }
            Err(e) => {
                error!(key, error = %e, "compute failed; serving default");
                T::default()
            }
        }
    }

    pub async fn clear_all(&self) -> Result<(), CacheError> {
        self.store.clear_all().await
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.store.get(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    debug!(key, "cache hit");
                    Some(value)
                }
                Err(e) => {
                    warn!(key, error = %e, "undecodable cache entry; recomputing");
                    None
                }
            },
            Ok(None) => {
                debug!(key, "cache miss");
                None
            }
            Err(e) => {
                warn!(key, error = %e, "cache read failed; recomputing");
                None
            }
        }
    }

    /// Encode inline, write in the background. The caller never waits on the
    /// cache service, and a failed write is only logged.
    fn store_value<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let payload = match serde_json::to_vec(value) {
            Ok(payload) => payload,
            Err(e) => {
                error!(key, error = %e, "failed to encode cache entry");
                return;
            }
        };

        let store = Arc::clone(&self.store);
        let key = key.to_string();
        tokio::spawn(async move {
            if let Err(e) = store.set(&key, &payload, ttl).await {
                warn!(key = %key, error = %e, "cache write failed");
            }
        });
    }
}
