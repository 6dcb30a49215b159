//! Configuration loading, validation, and management for keyrelay.
//!
//! Loads configuration from `~/.keyrelay/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.keyrelay/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Channel store configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Channel administration settings
    #[serde(default)]
    pub channels: ChannelsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// "sqlite" or "memory"
    #[serde(default = "default_database_backend")]
    pub backend: String,

    /// SQLite file path; defaults to `~/.keyrelay/channels.sqlite`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_backend() -> String {
    "sqlite".into()
}
fn default_max_connections() -> u32 {
    4
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_database_backend(),
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// The SQLite path to open, falling back to the config directory.
    pub fn sqlite_path(&self) -> String {
        self.path.clone().unwrap_or_else(|| {
            AppConfig::config_dir()
                .join("channels.sqlite")
                .to_string_lossy()
                .into_owned()
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Request body limit; bulk imports are the largest payloads.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_port() -> u16 {
    3000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_max_body_bytes() -> usize {
    8 * 1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelsConfig {
    /// Page size for channel listings
    #[serde(default = "default_items_per_page")]
    pub items_per_page: usize,
}

fn default_items_per_page() -> usize {
    10
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            items_per_page: default_items_per_page(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.keyrelay/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `KEYRELAY_DATABASE_PATH`
    /// - `KEYRELAY_ITEMS_PER_PAGE`
    /// - `KEYRELAY_PORT`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(path) = std::env::var("KEYRELAY_DATABASE_PATH") {
            self.database.path = Some(path);
        }

        if let Ok(raw) = std::env::var("KEYRELAY_ITEMS_PER_PAGE") {
            self.channels.items_per_page = raw.parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "KEYRELAY_ITEMS_PER_PAGE must be a positive integer, got '{raw}'"
                ))
            })?;
        }

        if let Ok(raw) = std::env::var("KEYRELAY_PORT") {
            self.gateway.port = raw.parse().map_err(|_| {
                ConfigError::ValidationError(format!("KEYRELAY_PORT is not a valid port: '{raw}'"))
            })?;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".keyrelay")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.channels.items_per_page == 0 {
            return Err(ConfigError::ValidationError(
                "channels.items_per_page must be at least 1".into(),
            ));
        }

        match self.database.backend.as_str() {
            "sqlite" | "memory" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "database.backend must be \"sqlite\" or \"memory\", got \"{other}\""
                )));
            }
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
