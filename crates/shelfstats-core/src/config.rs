//! Application configuration management.
//!
//! This module handles loading the dashboard configuration: the reading-site
//! user name, the yearly reading-challenge goal, optional progress-service
//! credentials and where the bundled data lives.
//!
//! Configuration is stored at `~/.config/shelfstats/config.json` unless a
//! path is given explicitly.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::progress::MatchPolicy;

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "shelfstats";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Yearly goal used when the config does not set one
pub const DEFAULT_READING_CHALLENGE_GOAL: u32 = 50;

/// Default location of the bundled overrides
const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Owner identifier on the reading site; also the cache key
    #[serde(default)]
    pub livelib_username: String,
    #[serde(default = "default_goal")]
    pub reading_challenge_goal: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardcover_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardcover_user_id: Option<String>,
    /// Override for the reading-site JSON endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub livelib_base_url: Option<String>,
    /// Override for the progress GraphQL endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardcover_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Read books from an exported JSON file instead of the live site
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_books_path: Option<PathBuf>,
    /// How the progress service's list is matched to the local book
    #[serde(default)]
    pub progress_match_policy: MatchPolicy,
}

fn default_goal() -> u32 {
    DEFAULT_READING_CHALLENGE_GOAL
}

impl Default for Config {
    fn default() -> Self {
        Self {
            livelib_username: String::new(),
            reading_challenge_goal: DEFAULT_READING_CHALLENGE_GOAL,
            hardcover_api_key: None,
            hardcover_user_id: None,
            livelib_base_url: None,
            hardcover_endpoint: None,
            data_dir: None,
            static_books_path: None,
            progress_match_policy: MatchPolicy::default(),
        }
    }
}

impl Config {
    /// Load from the default location, or defaults if the file does not exist
    pub fn load() -> Result<Self> {
        Self::load_or_default(&Self::config_path()?)
    }

    /// Defaults when `path` does not exist; a file that exists must parse
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load from an explicit path; the file must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }

    /// The owner key, or an error when the config does not name one
    pub fn owner(&self) -> Result<&str> {
        let owner = self.livelib_username.trim();
        if owner.is_empty() {
            anyhow::bail!("No reading-site username configured (livelibUsername)");
        }
        Ok(owner)
    }

    /// Goal used for the challenge percentage; never zero
    pub fn challenge_goal(&self) -> u32 {
        self.reading_challenge_goal.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = serde_json::from_str(r#"{"livelibUsername": "reader"}"#).unwrap();
        assert_eq!(config.owner().unwrap(), "reader");
        assert_eq!(config.reading_challenge_goal, DEFAULT_READING_CHALLENGE_GOAL);
        assert!(config.hardcover_api_key.is_none());
        assert_eq!(config.data_dir(), PathBuf::from("data"));
        assert_eq!(config.progress_match_policy, MatchPolicy::FirstCurrentlyReading);
    }

    #[test]
    fn test_parse_match_policy() {
        let config: Config = serde_json::from_str(
            r#"{"livelibUsername": "reader", "progressMatchPolicy": "title-or-author"}"#,
        )
        .unwrap();
        assert_eq!(config.progress_match_policy, MatchPolicy::TitleOrAuthor);

        let bad = serde_json::from_str::<Config>(r#"{"progressMatchPolicy": "closest"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "livelibUsername": "reader",
            "readingChallengeGoal": 24,
            "hardcoverApiKey": "key",
            "hardcoverUserId": "42",
            "dataDir": "/srv/shelf/data"
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.challenge_goal(), 24);
        assert_eq!(config.hardcover_user_id.as_deref(), Some("42"));
        assert_eq!(config.data_dir(), PathBuf::from("/srv/shelf/data"));
    }

    #[test]
    fn test_missing_owner_is_error() {
        let config = Config::default();
        assert!(config.owner().is_err());
    }

    #[test]
    fn test_zero_goal_is_clamped() {
        let config = Config {
            reading_challenge_goal: 0,
            ..Config::default()
        };
        assert_eq!(config.challenge_goal(), 1);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"livelibUsername": "reader", "readingChallengeGoal": 12}"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.reading_challenge_goal, 12);
        assert!(Config::load_from(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_load_or_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = Config::load_or_default(&path).unwrap();
        assert_eq!(config.reading_challenge_goal, DEFAULT_READING_CHALLENGE_GOAL);

        std::fs::write(&path, r#"{"livelibUsername": "reader",}"#).unwrap();
        let err = Config::load_or_default(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }
}
