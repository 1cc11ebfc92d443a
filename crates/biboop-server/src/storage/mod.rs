//! SQLite entity store for Biboop.
//!
//! Authoritative persistence for users, servers, and commands. Entity keys
//! are derived from each entity's natural uniqueness constraint so creation
//! can be a conditional insert on the key.

mod db;
mod keys;
mod models;
mod queries;
mod queries_commands;


pub use db::{Database, StoreError};
pub use keys::{server_key, user_key};
pub use models::*;
pub use queries::NewServer;
pub use queries_commands::NewCommand;
