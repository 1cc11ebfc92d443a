//! Command definition queries.
//!
//! Commands are never cached; every read goes to the store.

use super::db::{Database, StoreError};
use super::models::{Command, CommandParam, CommandRow};

/// Parameters for inserting a command definition.
#[derive(Debug, Clone, Copy)]
pub struct NewCommand<'a> {
    pub id: &'a str,
    pub owner_id: &'a str,
    pub private: bool,
    pub name: &'a str,
    pub description: &'a str,
    pub command: &'a str,
    pub params: &'a [CommandParam],
    pub now: i64,
}

impl TryFrom<CommandRow> for Command {
    type Error = StoreError;

    fn try_from(row: CommandRow) -> Result<Self, Self::Error> {
        let params = serde_json::from_str(&row.params)
            .map_err(|e| StoreError::Corrupt(format!("command {} params: {e}", row.id)))?;
        Ok(Self {
            id: row.id,
            owner_id: row.owner_id,
            private: row.private,
            name: row.name,
            description: row.description,
            command: row.command,
            params,
            created_at: row.created_at,
        })
    }
}

impl Database {
    /// Store a new command definition.
    pub async fn create_command(&self, new: NewCommand<'_>) -> Result<Command, StoreError> {
        let params_json = serde_json::to_string(new.params)
            .map_err(|e| StoreError::Corrupt(format!("command {} params: {e}", new.id)))?;

        sqlx::query(
            "INSERT INTO commands (id, owner_id, private, name, description, command, params, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(new.id)
        .bind(new.owner_id)
        .bind(new.private)
        .bind(new.name)
        .bind(new.description)
        .bind(new.command)
        .bind(&params_json)
        .bind(new.now)
        .execute(self.pool())
        .await?;

        self.get_command(new.id)
            .await?
            .ok_or_else(|| StoreError::Query(format!("Command {} vanished after insert", new.id)))
    }

    /// Get a command by key.
    pub async fn get_command(&self, id: &str) -> Result<Option<Command>, StoreError> {
        sqlx::query_as::<_, CommandRow>("SELECT * FROM commands WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .map(Command::try_from)
            .transpose()
    }

    /// List an owner's commands in creation order.
    pub async fn list_commands(&self, owner_id: &str) -> Result<Vec<Command>, StoreError> {
        sqlx::query_as::<_, CommandRow>(
            "SELECT * FROM commands WHERE owner_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(owner_id)
        .fetch_all(self.pool())
        .await?
        .into_iter()
        .map(Command::try_from)
        .collect()
    }
}
