//! Configuration management for notekeep.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::net::SocketAddr;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::archive::CONTAINER_NAME;
use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "notekeep";

/// Default document database file name.
const DOCUMENT_DB_FILE_NAME: &str = "documents.db";

/// Environment variable prefix.
const ENV_PREFIX: &str = "NOTEKEEP_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `NOTEKEEP_`, sections split by `__`)
/// 2. TOML config file at `~/.config/notekeep/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Archive client configuration.
    pub archive: ArchiveConfig,
    /// Ingest endpoint configuration.
    pub ingest: IngestConfig,
}

/// Archive client configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Directory backing the note container.
    /// Defaults to `~/.local/share/notekeep/notes`
    pub container_path: Option<PathBuf>,
}

/// Ingest endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Address the HTTP server binds to.
    pub bind_address: String,
    /// Document store endpoint: an `http(s)://` URL or an SQLite path.
    /// Defaults to `~/.local/share/notekeep/documents.db`
    pub store_endpoint: Option<String>,
    /// Access key for remote document stores.
    pub store_key: Option<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:7071".to_string(),
            store_endpoint: None,
            store_key: None,
        }
    }
}

/// Where the ingest endpoint persists documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentStoreTarget {
    /// Local SQLite database file.
    Sqlite(PathBuf),
    /// Remote document service.
    Http {
        /// Base URL of the service.
        endpoint: String,
        /// Access key sent with each request.
        key: String,
    },
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.ingest.bind_address.parse::<SocketAddr>().is_err() {
            return Err(Error::ConfigValidation {
                message: format!(
                    "invalid bind_address: {}",
                    self.ingest.bind_address
                ),
            });
        }

        if let Some(endpoint) = &self.ingest.store_endpoint {
            if endpoint.trim().is_empty() {
                return Err(Error::ConfigValidation {
                    message: "store_endpoint cannot be empty".to_string(),
                });
            }
            if is_http_endpoint(endpoint) && self.ingest.store_key.is_none() {
                return Err(Error::ConfigValidation {
                    message: format!("store_key is required for remote store {endpoint}"),
                });
            }
        }

        Ok(())
    }

    /// Get the archive container path, resolving defaults if not set.
    #[must_use]
    pub fn container_path(&self) -> PathBuf {
        self.archive
            .container_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(CONTAINER_NAME))
    }

    /// Resolve where the ingest endpoint stores its documents.
    ///
    /// # Errors
    ///
    /// Returns an error if a remote endpoint is configured without a key.
    pub fn document_store(&self) -> Result<DocumentStoreTarget> {
        match &self.ingest.store_endpoint {
            None => Ok(DocumentStoreTarget::Sqlite(
                Self::default_data_dir().join(DOCUMENT_DB_FILE_NAME),
            )),
            Some(endpoint) if is_http_endpoint(endpoint) => {
                let key = self.ingest.store_key.clone().ok_or_else(|| {
                    Error::ConfigValidation {
                        message: format!("store_key is required for remote store {endpoint}"),
                    }
                })?;
                Ok(DocumentStoreTarget::Http {
                    endpoint: endpoint.clone(),
                    key,
                })
            }
            Some(path) => Ok(DocumentStoreTarget::Sqlite(PathBuf::from(path))),
        }
    }

    /// A copy of this configuration that is safe to print.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.ingest.store_key.is_some() {
            config.ingest.store_key = Some("********".to_string());
        }
        config
    }
}

fn is_http_endpoint(endpoint: &str) -> bool {
    endpoint.starts_with("http://") || endpoint.starts_with("https://")
}
