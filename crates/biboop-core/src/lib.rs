//! Biboop Core Library
//!
//! Shared functionality for Biboop components:
//! - Configuration resolution and hierarchy
//! - Common error types
//! - Clock helpers
//! - Tracing initialisation

pub mod clock;
pub mod config;
pub mod error;
pub mod tracing_init;

pub use config::Config;
pub use error::{Error, Result};
