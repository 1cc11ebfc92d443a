//! Cache key construction.
//!
//! A key is fully determined by the lookup criteria, so repeating a lookup
//! with the same criteria addresses the same entry. Each entity kind and
//! lookup field gets its own prefix. Secrets are hashed before they become
//! part of a key so credentials never appear in the cache keyspace.

use std::fmt;

use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key of the user resolved from `email`.
    pub fn user_by_email(email: &str) -> Self {
        Self(format!("User-email-{email}"))
    }

    /// Key of the user owning server API key `secret`.
    pub fn user_by_secret(secret: &str) -> Self {
        Self(format!("User-secret-{:x}", Sha256::digest(secret.as_bytes())))
    }

    /// Key of server `server_id` owned by user `owner_id`.
    pub fn server(owner_id: &str, server_id: &str) -> Self {
        Self(format!("Server-{owner_id}-{server_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
