//! Biboop Server Library
//!
//! Request-facing core of the Biboop service:
//! - SQLite entity store for users, servers, and commands
//! - Look-aside entity cache with pluggable backends
//! - Identity resolution from email or server API key
//! - Server and command registries
//! - Typed requests and the per-request context that serves them

pub mod cache;
pub mod commands;
pub mod context;
pub mod error;
pub mod identity;
pub mod requests;
pub mod servers;
pub mod storage;

#[cfg(test)]
mod test_helpers;

pub use context::{AppState, RequestContext};
pub use error::{Error, Result};
pub use identity::Principal;
