//! Configuration management for Taglet.
//!
//! This module provides configuration loading, saving, and defaults.
//! Configuration is stored in TOML format in a platform-appropriate location.

use crate::error::{Result, TagletError};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main configuration structure for Taglet.
///
/// ## Example Configuration File (taglet.toml)
///
/// ```toml
/// [search]
/// default_limit = 100
///
/// [persistence]
/// compress = true
/// snapshot_path = "/var/lib/taglet"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Search settings
    pub search: SearchConfig,

    /// Snapshot persistence settings
    pub persistence: PersistenceConfig,
}

/// Search configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of matches `find` returns by default
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig { default_limit: 100 }
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Compress the snapshot data section on save
    pub compress: bool,

    /// Snapshot file location (None = default data directory)
    pub snapshot_path: Option<PathBuf>,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        PersistenceConfig {
            compress: true,
            snapshot_path: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default config if no config file exists.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Config::default());
        }

        info!(path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents).map_err(|e| TagletError::ConfigError {
            reason: format!("failed to parse config: {}", e),
        })?;

        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        info!(path = %path.display(), "saving configuration");
        let contents = toml::to_string_pretty(self).map_err(|e| TagletError::ConfigError {
            reason: format!("failed to serialize config: {}", e),
        })?;

        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "taglet").ok_or_else(|| TagletError::ConfigError {
            reason: "could not determine config directory".to_string(),
        })?;

        Ok(dirs.config_dir().join("taglet.toml"))
    }

    /// Get the default data directory path.
    pub fn default_data_dir() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "taglet").ok_or_else(|| TagletError::ConfigError {
            reason: "could not determine data directory".to_string(),
        })?;

        Ok(dirs.data_dir().to_path_buf())
    }

    /// Get the snapshot directory (from config or default).
    pub fn snapshot_dir(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.persistence.snapshot_path {
            Ok(path.clone())
        } else {
            Self::default_data_dir()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.search.default_limit, 100);
        assert!(config.persistence.compress);
        assert!(config.persistence.snapshot_path.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let mut config = Config::default();
        config.search.default_limit = 25;
        config.persistence.compress = false;

        config.save_to(&config_path).unwrap();
        let loaded = Config::load_from(&config_path).unwrap();

        assert_eq!(loaded.search.default_limit, 25);
        assert!(!loaded.persistence.compress);
    }

    #[test]
    fn test_load_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.search.default_limit, 100); // Default value
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("partial.toml");
        fs::write(&config_path, "[search]\ndefault_limit = 10\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.search.default_limit, 10);
        assert!(config.persistence.compress); // default
    }

    #[test]
    fn test_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.toml");
        fs::write(&config_path, "not valid toml [[").unwrap();

        let result = Config::load_from(&config_path);
        assert!(matches!(result, Err(TagletError::ConfigError { .. })));
    }
}
