//! Configuration management for Specimen.
//!
//! Configuration is loaded from the platform config directory
//! (`config.toml`) with sensible defaults. All config structs implement
//! `Default`, so an empty or partial file is valid.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Specimen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Embedding model settings
    pub model: ModelConfig,

    /// Species catalog settings
    pub catalog: CatalogConfig,

    /// Class bank cache settings
    pub cache: CacheConfig,

    /// Zero-shot classifier settings
    pub classifier: ClassifierConfig,

    /// Upload limits
    pub limits: LimitsConfig,

    /// Web server settings
    pub server: ServerConfig,

    /// Observation database settings
    pub database: DatabaseConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/org.specimen.specimen/config.toml
    /// - Linux: ~/.config/specimen/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\specimen\config\config.toml
    ///
    /// Falls back to ~/.specimen/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("org", "specimen", "specimen")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".specimen").join("config.toml")
            })
    }

    /// Resolved data directory (with ~ expansion).
    pub fn data_dir(&self) -> PathBuf {
        expand(&self.general.data_dir)
    }

    /// Resolved model directory (with ~ expansion).
    pub fn model_dir(&self) -> PathBuf {
        expand(&self.general.model_dir)
    }

    /// Resolved species JSON path.
    ///
    /// Relative paths are taken relative to the data directory.
    pub fn species_file(&self) -> PathBuf {
        self.under_data_dir(&self.catalog.species_file)
    }

    /// Resolved class bank artifact path.
    pub fn cache_path(&self) -> PathBuf {
        self.under_data_dir(&self.cache.path)
    }

    /// Resolved media root for uploaded images.
    pub fn media_root(&self) -> PathBuf {
        self.under_data_dir(&self.server.media_root)
    }

    /// Resolved observation database file.
    pub fn database_path(&self) -> PathBuf {
        self.under_data_dir(&self.database.path)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    fn under_data_dir(&self, path: &Path) -> PathBuf {
        let expanded = expand(path);
        if expanded.is_absolute() {
            expanded
        } else {
            self.data_dir().join(expanded)
        }
    }
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&path_str).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.classifier.temperature, 100.0);
        assert_eq!(config.catalog.groups, vec!["plants", "insects"]);
        assert!(!config.cache.strict);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[classifier]"));
        assert!(toml.contains("[cache]"));
    }

    #[test]
    fn test_relative_paths_resolve_under_data_dir() {
        let mut config = Config::default();
        config.general.data_dir = PathBuf::from("/srv/specimen");
        assert_eq!(
            config.cache_path(),
            PathBuf::from("/srv/specimen/species_embeddings.bin")
        );
        assert_eq!(
            config.species_file(),
            PathBuf::from("/srv/specimen/species.json")
        );
        assert_eq!(
            config.media_root(),
            PathBuf::from("/srv/specimen/media")
        );
    }

    #[test]
    fn test_absolute_paths_kept() {
        let mut config = Config::default();
        config.cache.path = PathBuf::from("/tmp/bank.bin");
        assert_eq!(config.cache_path(), PathBuf::from("/tmp/bank.bin"));
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[classifier]\ntemperature = 50.0\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.classifier.temperature, 50.0);
        assert_eq!(config.model.context_length, 77);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[classifier]\ntemperature = 0.0\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
