//! Server registry.
//!
//! A server is identified by its owner and a caller-supplied identifier.
//! Polls go through the cache; user-initiated updates bypass it for the
//! read and overwrite it after the write.

use biboop_core::clock::unix_timestamp;
use tracing::{info, instrument, warn};

use crate::cache::{CacheKey, EntityCache};
use crate::error::{Error, Result};
use crate::storage::{Database, NewServer, Server, ServerDetails, User, server_key};

pub struct ServerRegistry<'a> {
    store: &'a Database,
    cache: &'a EntityCache,
}

impl<'a> ServerRegistry<'a> {
    pub const fn new(store: &'a Database, cache: &'a EntityCache) -> Self {
        Self { store, cache }
    }

    /// Heartbeat: find or register `server_id` for `user` and record the
    /// poll.
    ///
    /// The server is looked up through the cache, but the poll time (and
    /// any supplied details) is always persisted to the store. The cached
    /// snapshot is only rewritten when name or description changed, so a
    /// plain heartbeat leaves it as it was; the returned server always
    /// reflects the store.
    #[instrument(skip(self, user, details), fields(owner_id = %user.id))]
    pub async fn get_or_create_for_poll(
        &self,
        user: &User,
        server_id: &str,
        details: &ServerDetails,
    ) -> Result<Server> {
        require_server_id(server_id)?;
        let key = CacheKey::server(&user.id, server_id);
        let now = unix_timestamp();

        if let Some(cached) = self.cache.lookup::<Server>(&key).await {
            if let Some(server) = self.store.refresh_server(&cached.id, details, now).await? {
                if details.differs_from(&cached) {
                    self.cache.store(&key, &server).await;
                }
                return Ok(server);
            }
            warn!(server_key = %cached.id, "Cached server has no stored row");
            self.cache.invalidate(&key).await;
        }

        let server = self.refresh_or_create(user, server_id, details, now).await?;
        self.cache.store(&key, &server).await;
        Ok(server)
    }

    /// User-initiated create-or-update of `server_id`.
    ///
    /// Reads and writes the store directly, then overwrites the cached
    /// snapshot so later polls see the edit.
    #[instrument(skip(self, user, details), fields(owner_id = %user.id))]
    pub async fn update_for_request(
        &self,
        user: &User,
        server_id: &str,
        details: &ServerDetails,
    ) -> Result<Server> {
        require_server_id(server_id)?;
        let server = self
            .refresh_or_create(user, server_id, details, unix_timestamp())
            .await?;
        self.cache
            .store(&CacheKey::server(&user.id, server_id), &server)
            .await;
        Ok(server)
    }

    /// All servers owned by `user`, straight from the store.
    pub async fn list_for_user(&self, user: &User) -> Result<Vec<Server>> {
        Ok(self.store.list_servers(&user.id).await?)
    }

    async fn refresh_or_create(
        &self,
        user: &User,
        server_id: &str,
        details: &ServerDetails,
        now: i64,
    ) -> Result<Server> {
        let id = server_key(&user.id, server_id);
        if let Some(server) = self.store.refresh_server(&id, details, now).await? {
            return Ok(server);
        }

        let (server, created) = self
            .store
            .create_server_if_absent(NewServer {
                id: &id,
                owner_id: &user.id,
                server_id,
                name: details.name.as_deref().unwrap_or(server_id),
                description: details.description.as_deref().unwrap_or_default(),
                now,
            })
            .await?;

        if created {
            info!(server_key = %server.id, server_id, "Server registered");
            return Ok(server);
        }

        // Another request registered it first; apply this call on top.
        self.store
            .refresh_server(&id, details, now)
            .await?
            .ok_or_else(|| Error::NotFound(format!("server {server_id}")))
    }
}

fn require_server_id(server_id: &str) -> Result<()> {
    if server_id.trim().is_empty() {
        return Err(Error::ValidationFailed("serverId is required".into()));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cache::CacheBackend;
    use crate::storage::StoreError;
    use crate::test_helpers::{setup_state, setup_state_with_failing_cache};

    fn named(name: &str) -> ServerDetails {
        ServerDetails::new(Some(name.into()), None)
    }

    #[tokio::test]
    async fn first_poll_registers_and_second_reuses() {
        let (state, _) = setup_state().await;
        let user = state
            .identity()
            .resolve_or_create_by_email("a@x.com")
            .await
            .unwrap();
        let servers = state.servers();

        let first = servers
            .get_or_create_for_poll(&user, "box1", &named("Box One"))
            .await
            .unwrap();
        assert_eq!(first.pending_commands, 0);
        assert_eq!(first.name, "Box One");
        assert_eq!(first.owner_id, user.id);

        let second = servers
            .get_or_create_for_poll(&user, "box1", &named("Box One"))
            .await
            .unwrap();
        assert_eq!(second.id, first.id);
        assert!(second.last_poll_time >= first.last_poll_time);
        assert_eq!(second.pending_commands, 0);
        assert_eq!(state.store().list_servers(&user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn heartbeat_persists_but_keeps_cached_snapshot() {
        let (state, backend) = setup_state().await;
        let user = state
            .identity()
            .resolve_or_create_by_email("a@x.com")
            .await
            .unwrap();
        let servers = state.servers();
        let first = servers
            .get_or_create_for_poll(&user, "box1", &ServerDetails::default())
            .await
            .unwrap();

        sqlx::query("UPDATE servers SET pending_commands = 3, last_poll_time = 0 WHERE id = ?")
            .bind(&first.id)
            .execute(state.store().pool())
            .await
            .unwrap();

        let polled = servers
            .get_or_create_for_poll(&user, "box1", &ServerDetails::default())
            .await
            .unwrap();
        assert_eq!(polled.pending_commands, 3);
        assert!(polled.last_poll_time >= first.last_poll_time);

        let stored = state
            .store()
            .find_server(&user.id, "box1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.last_poll_time, polled.last_poll_time);

        let cached: Server = serde_json::from_slice(
            &backend
                .get(CacheKey::server(&user.id, "box1").as_str())
                .await
                .unwrap()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(cached.pending_commands, 0);
    }

    #[tokio::test]
    async fn poll_with_new_name_refreshes_cache() {
        let (state, _) = setup_state().await;
        let user = state
            .identity()
            .resolve_or_create_by_email("a@x.com")
            .await
            .unwrap();
        let servers = state.servers();
        servers
            .get_or_create_for_poll(&user, "box1", &named("Box One"))
            .await
            .unwrap();
        servers
            .get_or_create_for_poll(&user, "box1", &named("Box Uno"))
            .await
            .unwrap();

        let cached: Server = state
            .cache()
            .lookup(&CacheKey::server(&user.id, "box1"))
            .await
            .unwrap();
        assert_eq!(cached.name, "Box Uno");
    }

    #[tokio::test]
    async fn update_is_visible_to_store_and_cache() {
        let (state, _) = setup_state().await;
        let user = state
            .identity()
            .resolve_or_create_by_email("a@x.com")
            .await
            .unwrap();
        let servers = state.servers();
        let polled = servers
            .get_or_create_for_poll(&user, "box1", &named("Box One"))
            .await
            .unwrap();

        let updated = servers
            .update_for_request(
                &user,
                "box1",
                &ServerDetails::new(None, Some("moved to rack 4".into())),
            )
            .await
            .unwrap();
        assert_eq!(updated.id, polled.id);
        assert_eq!(updated.name, "Box One");

        let stored = state.store().find_server(&user.id, "box1").await.unwrap().unwrap();
        assert_eq!(stored.description, "moved to rack 4");

        let cached: Server = state
            .cache()
            .lookup(&CacheKey::server(&user.id, "box1"))
            .await
            .unwrap();
        assert_eq!(cached.description, "moved to rack 4");
    }

    #[tokio::test]
    async fn update_creates_unknown_server() {
        let (state, _) = setup_state().await;
        let user = state
            .identity()
            .resolve_or_create_by_email("a@x.com")
            .await
            .unwrap();

        let server = state
            .servers()
            .update_for_request(&user, "box9", &ServerDetails::default())
            .await
            .unwrap();

        assert_eq!(server.name, "box9");
        assert_eq!(server.description, "");
        assert_eq!(server.pending_commands, 0);
    }

    #[tokio::test]
    async fn identifiers_are_scoped_per_owner() {
        let (state, _) = setup_state().await;
        let alice = state
            .identity()
            .resolve_or_create_by_email("alice@x.com")
            .await
            .unwrap();
        let bob = state
            .identity()
            .resolve_or_create_by_email("bob@x.com")
            .await
            .unwrap();
        let servers = state.servers();

        let a = servers
            .get_or_create_for_poll(&alice, "box1", &ServerDetails::default())
            .await
            .unwrap();
        let b = servers
            .get_or_create_for_poll(&bob, "box1", &ServerDetails::default())
            .await
            .unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(servers.list_for_user(&alice).await.unwrap(), vec![a]);
    }

    #[tokio::test]
    async fn list_for_user_without_servers_is_empty() {
        let (state, _) = setup_state().await;
        let user = state
            .identity()
            .resolve_or_create_by_email("a@x.com")
            .await
            .unwrap();
        assert!(state.servers().list_for_user(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cache_outage_still_polls() {
        let state = setup_state_with_failing_cache().await;
        let user = state
            .identity()
            .resolve_or_create_by_email("a@x.com")
            .await
            .unwrap();
        let servers = state.servers();

        let first = servers
            .get_or_create_for_poll(&user, "box1", &ServerDetails::default())
            .await
            .unwrap();
        let second = servers
            .get_or_create_for_poll(&user, "box1", &ServerDetails::default())
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn stale_cache_entry_without_row_is_recreated() {
        let (state, backend) = setup_state().await;
        let user = state
            .identity()
            .resolve_or_create_by_email("a@x.com")
            .await
            .unwrap();
        let servers = state.servers();
        let first = servers
            .get_or_create_for_poll(&user, "box1", &ServerDetails::default())
            .await
            .unwrap();
        sqlx::query("DELETE FROM servers WHERE id = ?")
            .bind(&first.id)
            .execute(state.store().pool())
            .await
            .unwrap();

        let again = servers
            .get_or_create_for_poll(&user, "box1", &ServerDetails::default())
            .await
            .unwrap();
        assert_eq!(again.id, first.id);
        assert!(
            backend
                .get(CacheKey::server(&user.id, "box1").as_str())
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn blank_identifier_is_rejected() {
        let (state, _) = setup_state().await;
        let user = state
            .identity()
            .resolve_or_create_by_email("a@x.com")
            .await
            .unwrap();
        let err = state
            .servers()
            .get_or_create_for_poll(&user, "  ", &ServerDetails::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let (state, _) = setup_state().await;
        let user = state
            .identity()
            .resolve_or_create_by_email("a@x.com")
            .await
            .unwrap();
        state.store().close().await;

        let err = state
            .servers()
            .update_for_request(&user, "box1", &ServerDetails::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(StoreError::Query(_))));
    }
}
