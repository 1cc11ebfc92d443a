//! User and server queries for the Biboop entity store.

use super::db::{Database, StoreError};
use super::models::{Server, ServerDetails, User};

/// Fields of a server that does not exist yet.
#[derive(Debug, Clone, Copy)]
pub struct NewServer<'a> {
    pub id: &'a str,
    pub owner_id: &'a str,
    pub server_id: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub now: i64,
}

impl Database {
    // =========================================================================
    // User queries
    // =========================================================================

    /// Get a user by key.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(user)
    }

    /// Find a user by server API key.
    pub async fn find_user_by_api_key(
        &self,
        server_api_key: &str,
    ) -> Result<Option<User>, StoreError> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE server_api_key = ? LIMIT 1")
                .bind(server_api_key)
                .fetch_optional(self.pool())
                .await?;
        Ok(user)
    }

    /// Insert a user unless one with the same email already exists.
    ///
    /// Runs in one transaction: the conditional insert and the read of the
    /// winning row see the same state, so concurrent callers racing on one
    /// email all get the first committed row (and its API key) back.
    /// Returns the stored user and whether this call created it.
    pub async fn create_user_if_absent(
        &self,
        id: &str,
        email: &str,
        server_api_key: &str,
        now: i64,
    ) -> Result<(User, bool), StoreError> {
        let mut tx = self.pool().begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO users (id, email, server_api_key, created_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(email)
        .bind(server_api_key)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((user, inserted))
    }

    /// Count stored users.
    pub async fn count_users(&self) -> Result<i64, StoreError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool())
            .await?;
        Ok(row.0)
    }

    // =========================================================================
    // Server queries
    // =========================================================================

    /// Find a server by owner and caller-supplied identifier.
    pub async fn find_server(
        &self,
        owner_id: &str,
        server_id: &str,
    ) -> Result<Option<Server>, StoreError> {
        let server = sqlx::query_as::<_, Server>(
            "SELECT * FROM servers WHERE owner_id = ? AND server_id = ? LIMIT 1",
        )
        .bind(owner_id)
        .bind(server_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(server)
    }

    /// Insert a server unless its key is already taken.
    ///
    /// Returns the stored server and whether this call created it.
    pub async fn create_server_if_absent(
        &self,
        new: NewServer<'_>,
    ) -> Result<(Server, bool), StoreError> {
        let mut tx = self.pool().begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO servers \
             (id, owner_id, server_id, name, description, last_poll_time, pending_commands, registered_at) \
             VALUES (?, ?, ?, ?, ?, ?, 0, ?) \
             ON CONFLICT DO NOTHING",
        )
        .bind(new.id)
        .bind(new.owner_id)
        .bind(new.server_id)
        .bind(new.name)
        .bind(new.description)
        .bind(new.now)
        .bind(new.now)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        let server = sqlx::query_as::<_, Server>("SELECT * FROM servers WHERE id = ?")
            .bind(new.id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((server, inserted))
    }

    /// Record a poll of an existing server and apply optional details.
    ///
    /// `last_poll_time` never moves backwards. Returns `None` when no server
    /// has this key.
    pub async fn refresh_server(
        &self,
        id: &str,
        details: &ServerDetails,
        now: i64,
    ) -> Result<Option<Server>, StoreError> {
        let server = sqlx::query_as::<_, Server>(
            "UPDATE servers SET \
             name = COALESCE(?, name), \
             description = COALESCE(?, description), \
             last_poll_time = MAX(last_poll_time, ?) \
             WHERE id = ? RETURNING *",
        )
        .bind(details.name.as_deref())
        .bind(details.description.as_deref())
        .bind(now)
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(server)
    }

    /// List all servers of an owner, oldest registration first.
    pub async fn list_servers(&self, owner_id: &str) -> Result<Vec<Server>, StoreError> {
        let servers = sqlx::query_as::<_, Server>(
            "SELECT * FROM servers WHERE owner_id = ? ORDER BY registered_at ASC, server_id ASC",
        )
        .bind(owner_id)
        .fetch_all(self.pool())
        .await?;
        Ok(servers)
    }
}
