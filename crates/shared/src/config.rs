//! Application configuration management.
//!
//! Sources, later ones winning:
//! 1. `config/default.{toml,..}`
//! 2. `config/{RUN_MODE}.{toml,..}` (`RUN_MODE` defaults to `development`)
//! 3. `DOCGATE__`-prefixed environment, `__` between keys
//!    (`DOCGATE__STORAGE__ROOT=/srv/wopi`)

use std::path::Path;

use docgate_core::storage::StorageBackend;
use serde::Deserialize;

use crate::access_token::AccessTokenConfig;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage backend, tagged by `type`.
    pub storage: StorageBackend,
    /// Access-token configuration.
    pub access_token: AccessTokenConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public base URL used when building resource URLs for clients.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: default_base_url(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        Self::load_from(Path::new("config"), &run_mode)
    }

    /// Loads configuration from files in `dir` and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read, a required key is missing,
    /// or the access-token secret is empty.
    pub fn load_from(dir: &Path, run_mode: &str) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(dir.join("default")).required(false))
            .add_source(config::File::from(dir.join(run_mode)).required(false))
            .add_source(config::Environment::with_prefix("DOCGATE").separator("__"))
            .build()?;

        let config: Self = config.try_deserialize()?;
        if config.access_token.secret.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "access_token.secret must not be empty".to_string(),
            ));
        }
        Ok(config)
    }
}
