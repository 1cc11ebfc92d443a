//! Command registry. Commands are read and written straight to the store.

use biboop_core::clock::unix_timestamp;
use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::requests::CreateCommandRequest;
use crate::storage::{Command, Database, NewCommand, User};

pub struct CommandRegistry<'a> {
    store: &'a Database,
}

impl<'a> CommandRegistry<'a> {
    pub const fn new(store: &'a Database) -> Self {
        Self { store }
    }

    /// Validate and store a new command definition owned by `owner`.
    pub async fn create(&self, owner: &User, request: &CreateCommandRequest) -> Result<Command> {
        request.validate()?;

        let id = Uuid::new_v4().to_string();
        let command = self
            .store
            .create_command(NewCommand {
                id: &id,
                owner_id: &owner.id,
                private: request.private,
                name: &request.name,
                description: &request.description,
                command: &request.command,
                params: &request.params,
                now: unix_timestamp(),
            })
            .await?;

        info!(command_id = %command.id, owner_id = %owner.id, name = %command.name, "Command created");
        Ok(command)
    }

    pub async fn list_for_user(&self, owner: &User) -> Result<Vec<Command>> {
        Ok(self.store.list_commands(&owner.id).await?)
    }
}
