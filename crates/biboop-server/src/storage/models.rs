//! Data models for the Biboop entity store.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    /// Polling credential. Generated once, never rotated.
    pub server_api_key: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub id: String,
    pub owner_id: String,
    /// Caller-supplied identifier, unique per owner.
    pub server_id: String,
    pub name: String,
    pub description: String,
    pub last_poll_time: i64,
    pub pending_commands: i64,
    pub registered_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandParam {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub id: String,
    pub owner_id: String,
    pub private: bool,
    pub name: String,
    pub description: String,
    pub command: String,
    pub params: Vec<CommandParam>,
    pub created_at: i64,
}

/// Row shape of the `commands` table; `params` is a JSON array.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct CommandRow {
    pub id: String,
    pub owner_id: String,
    pub private: bool,
    pub name: String,
    pub description: String,
    pub command: String,
    pub params: String,
    pub created_at: i64,
}

/// Optional name/description changes carried by a poll or update.
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerDetails {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl ServerDetails {
    pub fn new(name: Option<String>, description: Option<String>) -> Self {
        Self { name, description }
    }

    /// Whether applying these details to `server` would change it.
    pub fn differs_from(&self, server: &Server) -> bool {
        self.name.as_deref().is_some_and(|n| n != server.name)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d != server.description)
    }
}
