//! In-process cache backend with TTL expiry and a capacity bound.
//!
//! Backed by a `moka` future cache: entries expire `ttl` after they were
//! written, and once `max_entries` is reached the cache's admission policy
//! decides which entries to evict.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use biboop_core::config::CacheConfig;
use moka::future::Cache;

use super::backend::{CacheBackend, CacheError};

/// Thread-safe in-memory cache backend. Clones share the same entries.
#[derive(Clone)]
pub struct MemoryCache {
    entries: Cache<String, Arc<[u8]>>,
}

impl MemoryCache {
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(max_entries.max(1))
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(Duration::from_secs(config.ttl_secs), config.max_entries)
    }

    /// Number of live entries after pending evictions have been applied.
    #[cfg(test)]
    pub(crate) async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.entries.get(key).await.map(|bytes| bytes.to_vec()))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), value.into()).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.invalidate(key).await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get() {
        let cache = MemoryCache::new(Duration::from_secs(60), 8);
        cache.set("User-email-a@x.com", b"alice".to_vec()).await.unwrap();

        assert_eq!(
            cache.get("User-email-a@x.com").await.unwrap(),
            Some(b"alice".to_vec())
        );
        assert!(cache.get("User-email-b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn overwrite_replaces_value() {
        let cache = MemoryCache::new(Duration::from_secs(60), 8);
        cache.set("k", b"old".to_vec()).await.unwrap();
        cache.set("k", b"new".to_vec()).await.unwrap();

        assert_eq!(cache.get("k").await.unwrap(), Some(b"new".to_vec()));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = MemoryCache::new(Duration::from_millis(20), 8);
        cache.set("k", b"v".to_vec()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(cache.get("k").await.unwrap().is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn size_stays_within_capacity() {
        let cache = MemoryCache::new(Duration::from_secs(60), 16);
        for i in 0..200 {
            cache.set(&format!("Server-u1-box{i}"), b"s".to_vec()).await.unwrap();
        }

        assert!(cache.len().await <= 16);
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let cache = MemoryCache::new(Duration::from_secs(60), 8);
        cache.set("k", b"v".to_vec()).await.unwrap();
        cache.delete("k").await.unwrap();
        assert!(cache.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let cache = MemoryCache::new(Duration::from_secs(60), 8);
        let other = cache.clone();
        cache.set("k", b"v".to_vec()).await.unwrap();
        assert_eq!(other.get("k").await.unwrap(), Some(b"v".to_vec()));
    }
}
