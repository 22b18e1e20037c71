//! snipdex configuration management.
//!
//! Reads the configuration file at:
//! - Linux: ~/.config/snipdex/config.toml
//! - macOS: ~/Library/Application Support/snipdex/config.toml
//! - Windows: %APPDATA%\snipdex\config.toml

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::search::{CaseFolding, FieldMask, SearchQuery};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StorageConfig {
    /// Overrides the platform data directory
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Defaults applied to every search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchConfig {
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub folding: CaseFolding,
    #[serde(default = "enabled")]
    pub code: bool,
    #[serde(default = "enabled")]
    pub name: bool,
    #[serde(default = "enabled")]
    pub comment: bool,
    #[serde(default = "enabled")]
    pub tags: bool,
}

fn enabled() -> bool {
    true
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            folding: CaseFolding::default(),
            code: true,
            name: true,
            comment: true,
            tags: true,
        }
    }
}

impl SearchConfig {
    pub fn field_mask(&self) -> FieldMask {
        FieldMask {
            code: self.code,
            name: self.name,
            comment: self.comment,
            tags: self.tags,
        }
    }

    /// A query for `keywords` carrying the configured defaults
    pub fn query(&self, keywords: Vec<String>) -> SearchQuery {
        SearchQuery::new(keywords)
            .fields(self.field_mask())
            .case_sensitive(self.case_sensitive)
            .folding(self.folding)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayConfig {
    /// syntect theme used to highlight code
    #[serde(default = "default_theme")]
    pub theme: String,
}

fn default_theme() -> String {
    "base16-ocean.dark".to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("snipdex").join("config.toml"))
    }

    /// Loads the configuration from the default path, or defaults if there is none
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.storage.data_dir.is_none());
        assert!(!config.search.case_sensitive);
        assert_eq!(config.search.field_mask(), FieldMask::all());
        assert_eq!(config.display.theme, "base16-ocean.dark");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            "[search]\ncase_sensitive = true\nfolding = \"keywords-only\"\ncode = false\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.search.case_sensitive);
        assert_eq!(config.search.folding, CaseFolding::KeywordsOnly);
        assert!(!config.search.code);
        assert!(config.search.name);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_config_save_load() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.storage.data_dir = Some(temp.path().join("data"));
        config.logging.level = "debug".to_string();
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_query_uses_search_defaults() {
        let mut config = Config::default();
        config.search.tags = false;
        let query = config.search.query(vec!["x".to_string()]);
        assert!(!query.fields.tags);
        assert!(!query.case_sensitive);
    }
}
