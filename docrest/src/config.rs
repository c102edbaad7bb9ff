//! Configuration management using Figment
//!
//! Values are layered, later sources overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. `docrest.toml` in the working directory, if present
//! 3. `DOCREST_`-prefixed environment variables, with `__` separating
//!    nested keys (e.g. `DOCREST_STORE__CONNECTION_STRING`)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use docrest_core::config::StoreConfig;

pub const DEFAULT_CONFIG_FILE: &str = "docrest.toml";
pub const ENV_PREFIX: &str = "DOCREST_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] figment::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DocrestConfig {
    pub store: StoreConfig,
    /// Filter directive for the tracing subscriber, e.g. `info` or `docrest=debug`.
    pub log_level: String,
}

impl Default for DocrestConfig {
    fn default() -> Self {
        DocrestConfig { store: StoreConfig::default(), log_level: "info".to_string() }
    }
}

impl DocrestConfig {
    /// Load configuration from `docrest.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        Ok(Self::figment(path).extract()?)
    }

    pub fn figment(path: &str) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(DocrestConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}
