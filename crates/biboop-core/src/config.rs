//! Configuration resolution for Biboop.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (`<config dir>/biboop/settings.json`)
//! 3. Explicit config file (`--config`)
//! 4. Environment variables (`BIBOOP_*`)
//! 5. CLI arguments (highest priority, applied by the binary)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Complete Biboop configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Authoritative entity store settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    pub database_path: Option<PathBuf>,
    pub max_connections: u32,
    pub busy_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            max_connections: 5,
            busy_timeout_secs: 5,
        }
    }
}

impl StoreConfig {
    /// Configured database path, falling back to the per-user default.
    pub fn resolved_database_path(&self) -> Option<PathBuf> {
        self.database_path.clone().or_else(database_path)
    }
}

/// Look-aside cache settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Lifetime of a cached entity snapshot.
    pub ttl_secs: u64,
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 300, // 5 min
            max_entries: 16_384,
        }
    }
}

/// Logging output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(explicit_path: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_config_path() {
        if global_path.exists() {
            let global = load_config_file(&global_path)?;
            merge_config(&mut config, global);
        }
    }

    if let Some(path) = explicit_path {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file {} does not exist",
                path.display()
            )));
        }
        let explicit = load_config_file(path)?;
        merge_config(&mut config, explicit);
    }

    apply_overrides(&mut config, |name| std::env::var(name).ok());

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("biboop").join("settings.json"))
}

/// Get the default database path.
pub fn database_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("biboop").join("biboop.db"))
}

/// One configuration file. Every field is optional; absent fields leave the
/// lower layer untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigLayer {
    store: StoreLayer,
    cache: CacheLayer,
    logging: LoggingLayer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoreLayer {
    database_path: Option<PathBuf>,
    max_connections: Option<u32>,
    busy_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CacheLayer {
    enabled: Option<bool>,
    ttl_secs: Option<u64>,
    max_entries: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoggingLayer {
    level: Option<String>,
    json: Option<bool>,
}

fn load_config_file(path: &Path) -> Result<ConfigLayer> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn merge_config(base: &mut Config, layer: ConfigLayer) {
    let ConfigLayer {
        store,
        cache,
        logging,
    } = layer;

    if store.database_path.is_some() {
        base.store.database_path = store.database_path;
    }
    if let Some(n) = store.max_connections {
        base.store.max_connections = n;
    }
    if let Some(secs) = store.busy_timeout_secs {
        base.store.busy_timeout_secs = secs;
    }

    if let Some(enabled) = cache.enabled {
        base.cache.enabled = enabled;
    }
    if let Some(secs) = cache.ttl_secs {
        base.cache.ttl_secs = secs;
    }
    if let Some(n) = cache.max_entries {
        base.cache.max_entries = n;
    }

    if let Some(level) = logging.level {
        base.logging.level = level;
    }
    if let Some(json) = logging.json {
        base.logging.json = json;
    }
}

/// Apply `BIBOOP_*` overrides read through `lookup`.
///
/// Values that fail to parse are ignored.
pub fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("BIBOOP_DB_PATH") {
        config.store.database_path = Some(PathBuf::from(val));
    }
    if let Some(n) = lookup("BIBOOP_DB_MAX_CONNECTIONS").and_then(|v| v.parse().ok()) {
        config.store.max_connections = n;
    }
    if let Some(enabled) = lookup("BIBOOP_CACHE_ENABLED").and_then(|v| v.parse().ok()) {
        config.cache.enabled = enabled;
    }
    if let Some(n) = lookup("BIBOOP_CACHE_TTL_SECS").and_then(|v| v.parse().ok()) {
        config.cache.ttl_secs = n;
    }
    if let Some(n) = lookup("BIBOOP_CACHE_MAX_ENTRIES").and_then(|v| v.parse().ok()) {
        config.cache.max_entries = n;
    }
    if let Some(val) = lookup("BIBOOP_LOG_LEVEL") {
        config.logging.level = val;
    }
    if let Some(json) = lookup("BIBOOP_LOG_JSON").and_then(|v| v.parse().ok()) {
        config.logging.json = json;
    }
}
