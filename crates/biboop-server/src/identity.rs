//! Identity resolution.
//!
//! Maps an interactive principal's email or a server's API key to the
//! canonical [`User`]. Emails create a user on first sight; API keys never
//! do, since they are the polling credential.

use biboop_core::clock::unix_timestamp;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::cache::{CacheKey, EntityCache};
use crate::error::{Error, Result};
use crate::storage::{Database, User, user_key};

/// Resolved identity of a caller, supplied by the credential layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// Interactive user vouched for by the identity provider.
    Email(String),
    /// Server presenting its owner's API key.
    ServerSecret(String),
}

/// Generate a new server API key for `email`.
///
/// The timestamp only makes keys readable; uniqueness comes from the random
/// suffix, so keys minted within the same second never collide.
pub fn generate_server_api_key(email: &str, now: i64) -> String {
    format!("{email}-{now}-{}", Uuid::new_v4().simple())
}

pub struct IdentityResolver<'a> {
    store: &'a Database,
    cache: &'a EntityCache,
}

impl<'a> IdentityResolver<'a> {
    pub const fn new(store: &'a Database, cache: &'a EntityCache) -> Self {
        Self { store, cache }
    }

    /// Resolve any principal to its user.
    pub async fn resolve(&self, principal: &Principal) -> Result<User> {
        match principal {
            Principal::Email(email) => self.resolve_or_create_by_email(email).await,
            Principal::ServerSecret(secret) => self.resolve_by_secret(secret).await,
        }
    }

    /// Resolve the user for `email`, creating it on first sight.
    ///
    /// The resolved user is cached under both its email and its API key so
    /// the first heartbeat of any of its servers hits the cache.
    #[instrument(skip(self))]
    pub async fn resolve_or_create_by_email(&self, email: &str) -> Result<User> {
        if email.is_empty() {
            return Err(Error::ValidationFailed("email is required".into()));
        }

        let key = CacheKey::user_by_email(email);
        if let Some(user) = self.cache.lookup::<User>(&key).await {
            return Ok(user);
        }

        let id = user_key(email);
        let user = match self.store.get_user(&id).await? {
            Some(user) => user,
            None => self.create_user(&id, email).await?,
        };

        self.cache.store(&key, &user).await;
        self.cache
            .store(&CacheKey::user_by_secret(&user.server_api_key), &user)
            .await;
        Ok(user)
    }

    /// Resolve the user owning server API key `secret`.
    #[instrument(skip_all)]
    pub async fn resolve_by_secret(&self, secret: &str) -> Result<User> {
        if secret.is_empty() {
            return Err(Error::ValidationFailed("server API key is required".into()));
        }

        let key = CacheKey::user_by_secret(secret);
        self.cache
            .read_through(&key, || async {
                self.store
                    .find_user_by_api_key(secret)
                    .await
                    .map_err(Error::from)
            })
            .await?
            .ok_or_else(|| Error::NotFound("no user for server API key".into()))
    }

    async fn create_user(&self, id: &str, email: &str) -> Result<User> {
        let now = unix_timestamp();
        let api_key = generate_server_api_key(email, now);
        let (user, created) = self
            .store
            .create_user_if_absent(id, email, &api_key, now)
            .await?;

        if created {
            info!(user_id = %user.id, "User created");
        } else {
            debug!(user_id = %user.id, "Concurrent signup won; using stored user");
        }
        Ok(user)
    }
}
