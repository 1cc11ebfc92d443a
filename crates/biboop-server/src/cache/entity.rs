//! Cache-aside policy for entity snapshots.
//!
//! [`EntityCache`] serializes entities as JSON into a [`CacheBackend`] and
//! decides how backend trouble affects callers:
//!
//! - [`EntityCache::try_lookup`] reports backend failures as
//!   [`Error::CacheUnavailable`].
//! - [`EntityCache::lookup`] downgrades them to a miss, which is what the
//!   resolvers and registries use.
//! - [`EntityCache::store`] and [`EntityCache::invalidate`] are best-effort
//!   and never fail.
//!
//! An entry that no longer decodes counts as a miss and is deleted.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use biboop_core::config::CacheConfig;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::backend::{CacheBackend, CacheError, CacheStats, NoopCache};
use super::key::CacheKey;
use super::memory::MemoryCache;
use crate::error::{Error, Result};

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
}

/// Shared handle to the look-aside cache. Clones share backend and stats.
#[derive(Clone)]
pub struct EntityCache {
    backend: Arc<dyn CacheBackend>,
    counters: Arc<Counters>,
}

impl EntityCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            counters: Arc::new(Counters::default()),
        }
    }

    /// A cache that never hits.
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopCache))
    }

    /// Build the in-memory cache described by `config`.
    pub fn from_config(config: &CacheConfig) -> Self {
        if config.enabled {
            Self::new(Arc::new(MemoryCache::from_config(config)))
        } else {
            Self::disabled()
        }
    }

    /// Look up `key`, surfacing backend failures.
    pub async fn try_lookup<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>> {
        let bytes = match self.backend.get(key.as_str()).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                return Err(Error::CacheUnavailable(e));
            }
        };

        let Some(bytes) = bytes else {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "Cache miss");
            return Ok(None);
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Cache hit");
                Ok(Some(value))
            }
            Err(e) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                self.invalidate(key).await;
                Ok(None)
            }
        }
    }

    /// Look up `key`; a backend failure is logged and reported as a miss.
    pub async fn lookup<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        match self.try_lookup(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache lookup failed, falling back to store");
                None
            }
        }
    }

    /// Write `value` under `key`. Failures are logged and dropped.
    pub async fn store<T: Serialize>(&self, key: &CacheKey, value: &T) {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                let e = CacheError::Serialization(e.to_string());
                warn!(key = %key, error = %e, "Skipping cache write");
                return;
            }
        };

        if let Err(e) = self.backend.set(key.as_str(), bytes).await {
            self.counters.errors.fetch_add(1, Ordering::Relaxed);
            warn!(key = %key, error = %e, "Cache write failed");
        }
    }

    /// Remove `key`. Failures are logged and dropped; the entry then lives
    /// until its TTL runs out.
    pub async fn invalidate(&self, key: &CacheKey) {
        if let Err(e) = self.backend.delete(key.as_str()).await {
            self.counters.errors.fetch_add(1, Ordering::Relaxed);
            warn!(key = %key, error = %e, "Cache invalidation failed");
        }
    }

    /// Cache-aside read: return the cached value for `key`, or run `fetch`
    /// against the store and cache what it finds.
    pub async fn read_through<T, F, Fut>(&self, key: &CacheKey, fetch: F) -> Result<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        if let Some(value) = self.lookup(key).await {
            return Ok(Some(value));
        }

        let fetched = fetch().await?;
        if let Some(value) = &fetched {
            self.store(key, value).await;
        }
        Ok(fetched)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
        }
    }
}
