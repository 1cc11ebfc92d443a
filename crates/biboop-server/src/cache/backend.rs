//! Cache backend trait.
//!
//! Backends store opaque bytes under string keys. Implementations must be
//! safe for concurrent use; every call may fail without affecting the
//! correctness of callers, only their latency.

use async_trait::async_trait;

/// Failures of a cache backend or of (de)serializing a cached entry.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

/// Pluggable storage for cache entries.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get the bytes stored under `key`, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store `value` under `key`, replacing any previous entry.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError>;

    /// Remove the entry under `key` if present.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Backend that stores nothing. Used when caching is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

#[async_trait]
impl CacheBackend for NoopCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Vec<u8>) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses, including undecodable entries.
    pub misses: u64,
    /// Number of backend failures (reads and writes).
    pub errors: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
