//! Store configuration
//!
//! Loaded from a TOML file; every field has a default so an empty or missing
//! file is valid:
//!
//! ```toml
//! database_path = "/data/expensa.db"
//! pool_size = 1
//! busy_timeout_ms = 5000
//! log_filter = "expensa_core=debug"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Special database path that keeps everything in memory
pub const IN_MEMORY_PATH: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,
    /// Pooled SQLite connections. One keeps a single local connection.
    pub pool_size: u32,
    pub busy_timeout_ms: u64,
    /// `tracing` filter directive used when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            pool_size: 1,
            busy_timeout_ms: 5000,
            log_filter: "info".to_string(),
        }
    }
}

/// `<platform data dir>/expensa`
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("expensa")
}

fn default_database_path() -> PathBuf {
    default_data_dir().join("expensa.db")
}

impl Config {
    /// Config for tests and previews; nothing touches disk
    pub fn in_memory() -> Self {
        Self {
            database_path: PathBuf::from(IN_MEMORY_PATH),
            ..Self::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY_PATH
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Like `load`, but a missing file yields the defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(Error::Config("pool_size must be at least 1".to_string()));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("database_path must not be empty".to_string()));
        }
        Ok(())
    }
}
