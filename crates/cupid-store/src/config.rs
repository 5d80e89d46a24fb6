//! Store configuration

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Path used for a private in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// Configuration for [`crate::SqliteEdgeStore`]
///
/// Deserializes from the `[database]` section of the server config:
///
/// ```toml
/// [database]
/// path = "data/cupid.db"
/// pool_size = 4
/// busy_timeout_ms = 250
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Database file, or `:memory:`
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Number of pooled connections (in-memory databases always use one)
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// How long a connection waits on a locked database before giving up
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_path() -> PathBuf {
    PathBuf::from("cupid.db")
}

fn default_pool_size() -> usize {
    4
}

fn default_busy_timeout_ms() -> u64 {
    250
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            pool_size: default_pool_size(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl StoreConfig {
    /// Configuration for the database at `path` with default pooling
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Configuration for a private in-memory database
    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY)
    }

    /// Set the pool size
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Set the busy timeout
    pub fn with_busy_timeout_ms(mut self, busy_timeout_ms: u64) -> Self {
        self.busy_timeout_ms = busy_timeout_ms;
        self
    }

    /// Whether this names an in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY
    }

    /// Busy timeout as Duration
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.path, PathBuf::from("cupid.db"));
        assert_eq!(config.pool_size, 4);
        assert_eq!(config.busy_timeout(), Duration::from_millis(250));
        assert!(!config.is_in_memory());
    }

    #[test]
    fn test_in_memory() {
        assert!(StoreConfig::in_memory().is_in_memory());
    }

    #[test]
    fn test_builders() {
        let config = StoreConfig::new("/tmp/x.db")
            .with_pool_size(8)
            .with_busy_timeout_ms(10);
        assert_eq!(config.pool_size, 8);
        assert_eq!(config.busy_timeout_ms, 10);
    }
}
