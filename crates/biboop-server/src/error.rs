//! Error taxonomy returned to the request-handling layer.

use thiserror::Error;

use crate::cache::CacheError;
use crate::storage::StoreError;

/// Result type alias using the service [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Unknown credential, or an entity the caller required does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A required request field is missing or malformed.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// The authoritative store call failed. Never retried here.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// The cache backend failed. Only returned by strict cache lookups;
    /// everywhere else it is downgraded to a miss.
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(#[from] CacheError),
}
