//! Application state and per-request context.
//!
//! [`AppState`] owns the store and cache handles for the whole process.
//! Each request gets a [`RequestContext`] carrying the caller's
//! [`Principal`] next to borrowed handles, and exposes the operations a
//! request handler needs.

use biboop_core::Config;
use tracing::{debug, instrument};

use crate::cache::EntityCache;
use crate::commands::CommandRegistry;
use crate::error::Result;
use crate::identity::{IdentityResolver, Principal};
use crate::requests::{CreateCommandRequest, PollRequest, UpdateServerRequest};
use crate::servers::ServerRegistry;
use crate::storage::{Command, Database, Server, StoreError, User};

#[derive(Clone)]
pub struct AppState {
    store: Database,
    cache: EntityCache,
}

impl AppState {
    pub const fn new(store: Database, cache: EntityCache) -> Self {
        Self { store, cache }
    }

    /// Open the configured store and build the configured cache.
    pub async fn open(config: &Config) -> std::result::Result<Self, StoreError> {
        let path = config
            .store
            .resolved_database_path()
            .ok_or_else(|| StoreError::Io("cannot determine database path".into()))?;
        let store = Database::open(&path, &config.store).await?;
        let cache = EntityCache::from_config(&config.cache);
        debug!(
            cache_enabled = config.cache.enabled,
            ttl_secs = config.cache.ttl_secs,
            "Application state ready"
        );
        Ok(Self::new(store, cache))
    }

    pub const fn store(&self) -> &Database {
        &self.store
    }

    pub const fn cache(&self) -> &EntityCache {
        &self.cache
    }

    pub const fn identity(&self) -> IdentityResolver<'_> {
        IdentityResolver::new(&self.store, &self.cache)
    }

    pub const fn servers(&self) -> ServerRegistry<'_> {
        ServerRegistry::new(&self.store, &self.cache)
    }

    pub const fn commands(&self) -> CommandRegistry<'_> {
        CommandRegistry::new(&self.store)
    }

    /// Context for one request made by `principal`.
    pub const fn request(&self, principal: Principal) -> RequestContext<'_> {
        RequestContext {
            principal,
            store: &self.store,
            cache: &self.cache,
        }
    }
}

pub struct RequestContext<'a> {
    pub principal: Principal,
    pub store: &'a Database,
    pub cache: &'a EntityCache,
}

impl RequestContext<'_> {
    pub const fn identity(&self) -> IdentityResolver<'_> {
        IdentityResolver::new(self.store, self.cache)
    }

    pub const fn servers(&self) -> ServerRegistry<'_> {
        ServerRegistry::new(self.store, self.cache)
    }

    pub const fn commands(&self) -> CommandRegistry<'_> {
        CommandRegistry::new(self.store)
    }

    /// The user behind this request's principal.
    pub async fn user(&self) -> Result<User> {
        self.identity().resolve(&self.principal).await
    }

    #[instrument(skip_all, fields(server_id = %request.server_id))]
    pub async fn poll(&self, request: &PollRequest) -> Result<Server> {
        request.validate()?;
        let user = self.user().await?;
        self.servers()
            .get_or_create_for_poll(&user, &request.server_id, &request.details())
            .await
    }

    #[instrument(skip_all, fields(server_id = %request.server_id))]
    pub async fn update_server(&self, request: &UpdateServerRequest) -> Result<Server> {
        request.validate()?;
        let user = self.user().await?;
        self.servers()
            .update_for_request(&user, &request.server_id, &request.details())
            .await
    }

    pub async fn list_servers(&self) -> Result<Vec<Server>> {
        let user = self.user().await?;
        self.servers().list_for_user(&user).await
    }

    pub async fn create_command(&self, request: &CreateCommandRequest) -> Result<Command> {
        request.validate()?;
        let user = self.user().await?;
        self.commands().create(&user, request).await
    }

    pub async fn list_commands(&self) -> Result<Vec<Command>> {
        let user = self.user().await?;
        self.commands().list_for_user(&user).await
    }
}
