//! Shared test helpers for the resolver, registry and cache test modules.

#![allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::{CacheBackend, CacheError, EntityCache, MemoryCache};
use crate::context::AppState;
use crate::storage::Database;

/// Cache backend whose every call fails, standing in for a cache outage.
pub struct FailingCache;

#[async_trait]
impl CacheBackend for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Err(CacheError::Backend("connection refused".into()))
    }

    async fn set(&self, _key: &str, _value: Vec<u8>) -> Result<(), CacheError> {
        Err(CacheError::Backend("connection refused".into()))
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::Backend("connection refused".into()))
    }
}

/// In-memory store plus a memory cache whose backend is also returned, so
/// tests can inspect what was cached.
pub async fn setup_state() -> (AppState, MemoryCache) {
    let db = Database::open_in_memory().await.unwrap();
    let backend = MemoryCache::new(Duration::from_secs(60), 1024);
    let cache = EntityCache::new(Arc::new(backend.clone()));
    (AppState::new(db, cache), backend)
}

/// In-memory store behind a cache that is down.
pub async fn setup_state_with_failing_cache() -> AppState {
    let db = Database::open_in_memory().await.unwrap();
    AppState::new(db, EntityCache::new(Arc::new(FailingCache)))
}
