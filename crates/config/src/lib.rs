#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for sideload
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/sideload/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

pub mod constants;

use serde::{Deserialize, Serialize};
use sideload_errors::{ConfigError, Error};
use sideload_types::{ColorChoice, InstallMode, OutputFormat};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub paths: PathConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneralConfig {
    #[serde(default)]
    pub default_output: OutputFormat,
    #[serde(default)]
    pub color: ColorChoice,
}

/// Installer session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Identity of the application that owns the sessions
    #[serde(default = "default_app_id")]
    pub app_id: String,
    /// Broadcast action used for completion notifications; derived from
    /// `app_id` when unset
    #[serde(default)]
    pub completion_action: Option<String>,
    /// Name of the artifact stream inside the session
    #[serde(default = "default_write_name")]
    pub write_name: String,
    #[serde(default)]
    pub install_mode: InstallMode,
    /// Give up waiting for the installer after this many seconds
    #[serde(default)]
    pub pending_timeout_secs: Option<u64>,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub staging_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            app_id: default_app_id(),
            completion_action: None,
            write_name: default_write_name(),
            install_mode: InstallMode::Full,
            pending_timeout_secs: None,
        }
    }
}

fn default_app_id() -> String {
    constants::DEFAULT_APP_ID.to_string()
}

fn default_write_name() -> String {
    constants::DEFAULT_WRITE_NAME.to_string()
}

impl SessionConfig {
    /// Completion action, falling back to `<app_id>.INSTALL_COMPLETE`
    #[must_use]
    pub fn completion_action(&self) -> String {
        self.completion_action
            .clone()
            .unwrap_or_else(|| format!("{}{}", self.app_id, constants::COMPLETION_ACTION_SUFFIX))
    }

    #[must_use]
    pub fn pending_timeout(&self) -> Option<Duration> {
        self.pending_timeout_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir
            .join("sideload")
            .join(constants::CONFIG_FILE_NAME))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or parsed.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from an explicit path when given, otherwise the default location
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable holds a value that cannot
    /// be parsed into the expected type.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Ok(output) = std::env::var("SIDELOAD_OUTPUT") {
            self.general.default_output = match output.as_str() {
                "plain" => OutputFormat::Plain,
                "tty" => OutputFormat::Tty,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "SIDELOAD_OUTPUT".to_string(),
                        value: output,
                    }
                    .into())
                }
            };
        }

        if let Ok(color) = std::env::var("SIDELOAD_COLOR") {
            self.general.color = match color.as_str() {
                "always" => ColorChoice::Always,
                "auto" => ColorChoice::Auto,
                "never" => ColorChoice::Never,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "SIDELOAD_COLOR".to_string(),
                        value: color,
                    }
                    .into())
                }
            };
        }

        if let Ok(app_id) = std::env::var("SIDELOAD_APP_ID") {
            self.session.app_id = app_id;
        }

        if let Ok(timeout) = std::env::var("SIDELOAD_PENDING_TIMEOUT") {
            let secs = timeout.parse().map_err(|_| ConfigError::InvalidValue {
                field: "SIDELOAD_PENDING_TIMEOUT".to_string(),
                value: timeout,
            })?;
            self.session.pending_timeout_secs = Some(secs);
        }

        if let Ok(dir) = std::env::var("SIDELOAD_STAGING_DIR") {
            self.paths.staging_dir = Some(PathBuf::from(dir));
        }

        Ok(())
    }

    /// Check values that deserialize fine but cannot be used
    ///
    /// # Errors
    ///
    /// Returns an error for an empty application id or write name, or a zero
    /// pending timeout.
    pub fn validate(&self) -> Result<(), Error> {
        if self.session.app_id.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "session.app_id must not be empty".to_string(),
            }
            .into());
        }
        if self.session.write_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "session.write_name must not be empty".to_string(),
            }
            .into());
        }
        if self.session.pending_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "session.pending_timeout_secs".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        Ok(())
    }

    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        self.paths
            .staging_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::STAGING_DIR))
    }

    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.paths
            .log_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::LOGS_DIR))
    }
}
