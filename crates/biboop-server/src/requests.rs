//! Typed request bodies accepted from the request-handling layer.
//!
//! Handlers deserialize these from the wire and call `validate` before any
//! store or cache is touched.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::storage::{CommandParam, ServerDetails};

/// Heartbeat from a registered (or soon to be registered) server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollRequest {
    pub server_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// User edit of a server's name or description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServerRequest {
    pub server_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommandRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub command: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub params: Vec<CommandParam>,
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::ValidationFailed(format!("{field} is required")));
    }
    Ok(())
}

impl PollRequest {
    pub fn validate(&self) -> Result<()> {
        require("serverId", &self.server_id)
    }

    pub fn details(&self) -> ServerDetails {
        ServerDetails::new(self.name.clone(), self.description.clone())
    }
}

impl UpdateServerRequest {
    pub fn validate(&self) -> Result<()> {
        require("serverId", &self.server_id)
    }

    pub fn details(&self) -> ServerDetails {
        ServerDetails::new(self.name.clone(), self.description.clone())
    }
}

impl CreateCommandRequest {
    pub fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        require("command", &self.command)?;

        let mut seen = HashSet::new();
        for param in &self.params {
            require("param name", &param.name)?;
            if !seen.insert(param.name.as_str()) {
                return Err(Error::ValidationFailed(format!(
                    "duplicate param {}",
                    param.name
                )));
            }
        }
        Ok(())
    }
}
