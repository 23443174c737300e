//! Configuration for the key-value store.
//!
//! Structured configuration loaded from a TOML file with serde, validated
//! once at startup. Flags parsed by the binary may override individual
//! fields before validation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Cluster sizing and expiration sweeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Number of independent shards. Must be at least 1.
    #[serde(default = "default_shards")]
    pub shards: usize,
    /// Sweep interval in milliseconds. Zero disables the background sweeper
    /// and expiration is enforced only at access time.
    #[serde(default = "default_clean_interval_ms")]
    pub clean_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_shards() -> usize {
    100
}

fn default_clean_interval_ms() -> u64 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            shards: default_shards(),
            clean_interval_ms: default_clean_interval_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
        }
    }
}

impl StorageConfig {
    pub fn clean_interval(&self) -> Duration {
        Duration::from_millis(self.clean_interval_ms)
    }
}

impl Config {
    /// Reads and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind_address.is_empty() {
            return Err(ConfigError::Invalid(
                "server.bind_address must not be empty".to_string(),
            ));
        }
        if self.storage.shards < 1 {
            return Err(ConfigError::Invalid(
                "storage.shards must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.storage.shards, 100);
        assert_eq!(config.storage.clean_interval_ms, 1000);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[server]
bind_address = "0.0.0.0"
port = 9000

[storage]
shards = 8
clean_interval_ms = 500

[logging]
level = "debug"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.shards, 8);
        assert_eq!(config.storage.clean_interval(), Duration::from_millis(500));
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[storage]\nshards = 4\n").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.storage.shards, 4);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_zero_shards_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[storage]\nshards = 0\n").unwrap();

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(Config::load("/nonexistent/keyval.toml").is_err());
    }
}
