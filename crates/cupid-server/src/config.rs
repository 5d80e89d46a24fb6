//! Configuration file parsing for the server.
//!
//! Loads the listen address, database, explore and logging settings from a
//! TOML file. Every section and field is optional and falls back to its
//! default.

use cupid_explore::ExploreConfig;
use cupid_grpc::ServerConfig;
use cupid_store::StoreConfig;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Value out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Server configuration loaded from TOML
///
/// ```toml
/// [server]
/// host = "0.0.0.0"
/// port = 50051
///
/// [database]
/// path = "data/cupid.db"
///
/// [explore]
/// page_size = 10
///
/// [explore.retry]
/// max_attempts = 3
///
/// [logging]
/// level = "info"
/// json = true
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Listen address
    #[serde(default)]
    pub server: ServerSection,

    /// SQLite store
    #[serde(default)]
    pub database: StoreConfig,

    /// Page size, request deadline and retry policy
    #[serde(default)]
    pub explore: ExploreConfig,

    /// Log level and format
    #[serde(default)]
    pub logging: LoggingSection,
}

/// `[server]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Bind address (e.g., "127.0.0.1")
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    50051
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSection {
    /// gRPC server settings for this section
    pub fn to_server_config(&self) -> ServerConfig {
        ServerConfig::new(self.host.clone(), self.port)
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingSection {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate TOML text
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges across sections
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Invalid("server.host must not be empty".to_string()));
        }
        if self.database.pool_size == 0 {
            return Err(ConfigError::Invalid(
                "database.pool_size must be at least 1".to_string(),
            ));
        }
        self.explore
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.to_server_config().full_address(), "127.0.0.1:50051");
        assert_eq!(config.explore.page_size, 10);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.server, ServerSection::default());
        assert_eq!(config.database, StoreConfig::default());
    }

    #[test]
    fn test_parse_toml() {
        let config = AppConfig::parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 6000

            [database]
            path = "/var/lib/cupid/edges.db"
            pool_size = 8

            [explore]
            page_size = 25
            request_timeout_ms = 1500

            [explore.retry]
            max_attempts = 5

            [logging]
            level = "cupid=debug,info"
            json = true
            "#,
        )
        .unwrap();

        assert_eq!(config.server.to_server_config().full_address(), "0.0.0.0:6000");
        assert_eq!(config.database.pool_size, 8);
        assert_eq!(config.database.busy_timeout_ms, 250);
        assert_eq!(config.explore.page_size, 25);
        assert_eq!(config.explore.retry.max_attempts, 5);
        assert_eq!(config.explore.retry.base_delay_ms, 10);
        assert!(config.logging.json);
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert!(matches!(
            AppConfig::parse("[explore]\npage_size = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::parse("[database]\npool_size = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::parse("[server]\nport = \"eighty\""),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 7000").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 7000);

        assert!(matches!(
            AppConfig::from_file("/nonexistent/cupid.toml"),
            Err(ConfigError::FileRead(_))
        ));
    }
}
