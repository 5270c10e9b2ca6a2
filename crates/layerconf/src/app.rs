//! Application config schema and the process-wide instance.
//!
//! The default files under `config/` are compiled into the binary; the
//! overlay is picked with the `ENV` variable and placeholders read the
//! process environment at load time.

use crate::{ConfigError, ConfigHolder, Loader, MemorySource, impl_merge};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};

/// Root application config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
}

/// Database connection settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub driver: String,
}

/// HTTP server settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub timeout: TimeoutConfig,
}

/// Timeouts in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub api: u64,
    pub db: u64,
}

impl_merge!(
    AppConfig { database, server },
    DatabaseConfig { host, port, user, password, dbname, driver },
    ServerConfig { port, timeout },
    TimeoutConfig { api, db },
);

/// The config files shipped with the crate.
pub fn embedded_source() -> MemorySource {
    MemorySource::new()
        .with_file("config.yaml", include_str!("../config/config.yaml"))
        .with_file("config.test.yaml", include_str!("../config/config.test.yaml"))
}

static GLOBAL: LazyLock<ConfigHolder<AppConfig, MemorySource>> =
    LazyLock::new(|| ConfigHolder::new(Loader::new(embedded_source())));

/// Reload the process-wide config.
pub fn load() -> Result<(), ConfigError> {
    GLOBAL.load()
}

/// Process-wide config, loaded on first access.
///
/// # Panics
///
/// Panics if the first load fails.
pub fn get() -> Arc<AppConfig> {
    GLOBAL.get()
}
