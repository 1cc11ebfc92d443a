//! Look-aside cache over the entity store.
//!
//! The cache holds serialized snapshots of users and servers under keys
//! derived from the lookup criteria ([`CacheKey`]). It is never
//! authoritative: backend failures degrade to a miss, failed writes are
//! dropped, and every entry expires after the configured TTL.

pub mod backend;
pub mod entity;
pub mod key;
pub mod memory;

pub use backend::{CacheBackend, CacheError, CacheStats, NoopCache};
pub use entity::EntityCache;
pub use key::CacheKey;
pub use memory::MemoryCache;
