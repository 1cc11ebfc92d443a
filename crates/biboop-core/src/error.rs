//! Error types for the `Biboop` core library.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using `Biboop` Error.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A settings file could not be read.
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A settings file is not valid JSON for [`crate::Config`].
    #[error("Failed to parse config file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}
