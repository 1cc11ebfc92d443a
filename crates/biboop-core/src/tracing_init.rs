//! Shared tracing/logging initialization.
//!
//! The `biboop` binary and any embedding service set up `tracing_subscriber`
//! the same way: an env-filter seeded from [`LoggingConfig`] and optional
//! JSON output. Log lines go to stderr so stdout stays free for results.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Build the default filter directive for the given crate targets.
///
/// `RUST_LOG` still takes precedence when set.
pub fn default_filter(targets: &[&str], level: &str) -> String {
    targets
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialise the global tracing subscriber.
///
/// * `targets` -- crate targets that receive the configured level
///   (e.g. `["biboop_server", "biboop_core"]`).
/// * `logging` -- level and output format from configuration.
pub fn init_tracing(targets: &[&str], logging: &LoggingConfig) {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter(targets, &logging.level)),
    );
    if logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
