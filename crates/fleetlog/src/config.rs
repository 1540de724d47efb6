//! Configuration management for fleetlog.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "fleetlog";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "fleetlog.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FLEETLOG_`, sections split on `__`)
/// 2. TOML config file at `~/.config/fleetlog/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Outbound mail configuration.
    pub notify: NotifyConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/fleetlog/fleetlog.db`
    pub database_path: Option<PathBuf>,
}

/// How the connection to the mail relay is encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsMode {
    /// TLS from the first byte (usually port 465).
    #[default]
    Implicit,
    /// Plain connection upgraded with STARTTLS (usually port 587).
    #[serde(rename = "starttls")]
    StartTls,
}

/// Mail relay configuration for submission notices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Send mail on submission. When off, notices are only logged.
    pub enabled: bool,
    /// Relay host name.
    pub smtp_host: Option<String>,
    /// Relay port.
    pub smtp_port: u16,
    /// Channel encryption.
    pub tls: TlsMode,
    /// Relay login.
    pub username: Option<String>,
    /// Relay password.
    pub password: Option<String>,
    /// `From` address for notices.
    pub sender: Option<String>,
    /// Connection timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: None,
            smtp_port: 465,
            tls: TlsMode::Implicit,
            username: None,
            password: None,
            sender: None,
            timeout_secs: 30,
        }
    }
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
            .merge(Env::prefixed("FLEETLOG_").split("__"));

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
        let notify = &self.notify;

        if notify.smtp_port == 0 {
            return Err(Error::ConfigValidation {
                message: "notify.smtp_port must be greater than 0".to_string(),
            });
        }

        if notify.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "notify.timeout_secs must be greater than 0".to_string(),
            });
        }

        if notify.enabled {
            if notify.smtp_host.as_deref().map_or(true, |h| h.trim().is_empty()) {
                return Err(Error::ConfigValidation {
                    message: "notify.smtp_host is required when mail is enabled".to_string(),
                });
            }
            if notify.sender.as_deref().map_or(true, |s| s.trim().is_empty()) {
                return Err(Error::ConfigValidation {
                    message: "notify.sender is required when mail is enabled".to_string(),
                });
            }
            if notify.username.is_some() != notify.password.is_some() {
                return Err(Error::ConfigValidation {
                    message: "notify.username and notify.password must be set together"
                        .to_string(),
                });
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}
