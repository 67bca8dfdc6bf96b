//! Configuration management for the course tracker

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "course-tracker";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the `.mdx` lessons
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_dir: Option<PathBuf>,

    /// Seconds between time-spent flushes while a module is open
    pub time_flush_interval_secs: u64,

    /// Override for where progress records are kept
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self { content_dir: None, time_flush_interval_secs: 30, storage_dir: None }
    }
}

impl Config {
    /// Load configuration from disk, or create default if not exists
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {:?}", path))
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("", "", APP_NAME).context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.json"))
    }

    /// Get the data directory path
    pub fn data_dir() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("", "", APP_NAME).context("Failed to determine data directory")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    /// Directory of persisted records, honoring the override
    pub fn storage_dir(&self) -> Result<PathBuf> {
        match &self.storage_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::data_dir()?.join("storage")),
        }
    }

    /// Interval between time-spent flushes, never shorter than a second
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.time_flush_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_flushes_every_thirty_seconds() {
        let config = Config::default();
        assert_eq!(config.flush_interval(), Duration::from_secs(30));
        assert!(config.content_dir.is_none());
    }

    #[test]
    fn zero_interval_is_raised_to_one_second() {
        let config = Config { time_flush_interval_secs: 0, ..Config::default() };
        assert_eq!(config.flush_interval(), Duration::from_secs(1));
    }

    #[test]
    fn storage_dir_override_wins() {
        let config = Config { storage_dir: Some("/tmp/records".into()), ..Config::default() };
        assert_eq!(config.storage_dir().unwrap(), PathBuf::from("/tmp/records"));
    }

    #[test]
    fn config_deserializes_with_missing_fields() {
        let json = r#"{"content_dir":"/course/content"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.content_dir, Some(PathBuf::from("/course/content")));
        assert_eq!(config.time_flush_interval_secs, 30);
    }

    #[test]
    fn config_round_trips_through_a_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            content_dir: Some("lessons".into()),
            time_flush_interval_secs: 10,
            storage_dir: None,
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn unparsable_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
