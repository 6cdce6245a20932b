//! Application configuration.
//!
//! Settings come from an optional TOML file and are then overridden by
//! environment variables. Every field has a default, so an empty file (or no
//! file at all) yields a working local setup.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! admin_token = "change-me"
//!
//! [repository]
//! type = "local"
//!
//! [analytics]
//! max_batch_events = 100
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::db::RepositoryType;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "MARKETPLACE_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub analytics: IngestSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bearer token required on admin routes. Unset means admin routes are open.
    #[serde(default)]
    pub admin_token: Option<String>,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type", default = "default_repo_type")]
    pub repo_type: String,
}

/// Limits for the analytics ingestion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestSettings {
    #[serde(default = "default_max_batch_events")]
    pub max_batch_events: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit() -> usize {
    1024 * 1024
}

fn default_repo_type() -> String {
    "local".to_string()
}

fn default_max_batch_events() -> usize {
    100
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            admin_token: None,
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            repo_type: default_repo_type(),
        }
    }
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            max_batch_events: default_max_batch_events(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// First config file found among the standard locations, if any.
    pub fn find_default_location() -> Option<PathBuf> {
        [
            "marketplace.toml",
            "backend/marketplace.toml",
            "../marketplace.toml",
        ]
        .into_iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
    }

    /// Resolve the full configuration for a process.
    ///
    /// Uses `MARKETPLACE_CONFIG` if set, else the first default location,
    /// else built-in defaults; environment overrides are applied last.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        let mut config = match explicit.or_else(Self::find_default_location) {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Override settings from `HOST`, `PORT`, `ADMIN_TOKEN` and `REPOSITORY_TYPE`.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT".to_string(),
                value: port.clone(),
            })?;
        }
        if let Ok(token) = env::var("ADMIN_TOKEN") {
            let token = token.trim().to_string();
            self.server.admin_token = (!token.is_empty()).then_some(token);
        }
        if let Ok(repo_type) = env::var("REPOSITORY_TYPE") {
            self.repository.repo_type = repo_type;
        }
        Ok(())
    }

    pub fn repository_type(&self) -> Result<RepositoryType, ConfigError> {
        self.repository
            .repo_type
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "repository.type".to_string(),
                value: self.repository.repo_type.clone(),
            })
    }

    /// `host:port` for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
