//! Configuration file handling for ~/.config/trawl/config.toml.
//!
//! The file is optional — missing or empty yields `Config::default()`. It
//! is also the one piece of state the CLI writes back: `register` and
//! `login` persist the current user here.
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be
/// specified.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Name of the logged-in user; commands that write data require one.
    pub current_user: Option<String>,

    /// Database file override. Defaults to `trawl.db` next to the config
    /// file when unset.
    pub database: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Write the configuration back to disk.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let rendered = toml::to_string_pretty(self)?;
        std::fs::write(path, rendered)?;
        Ok(())
    }

    /// Set and persist the current user in one step.
    pub fn set_current_user(&mut self, name: &str, path: &Path) -> Result<(), ConfigError> {
        self.current_user = Some(name.to_string());
        self.save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config_path(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("trawl_config_test_{}", tag));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join("config.toml")
    }

    #[test]
    fn missing_file_returns_default() {
        let config = Config::load(Path::new("/tmp/trawl_test_nonexistent_config.toml")).unwrap();
        assert!(config.current_user.is_none());
        assert!(config.database.is_none());
    }

    #[test]
    fn empty_file_returns_default() {
        let path = temp_config_path("empty");
        std::fs::write(&path, "  \n").unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.current_user.is_none());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn partial_config_uses_defaults_for_missing() {
        let path = temp_config_path("partial");
        std::fs::write(&path, "current_user = \"alice\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.current_user.as_deref(), Some("alice"));
        assert!(config.database.is_none());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn invalid_toml_returns_error() {
        let path = temp_config_path("invalid");
        std::fs::write(&path, "this is not [valid toml").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn set_current_user_round_trips() {
        let path = temp_config_path("roundtrip");

        let mut config = Config::default();
        config.set_current_user("bob", &path).unwrap();

        let reloaded = Config::load(&path).unwrap();
        assert_eq!(reloaded.current_user.as_deref(), Some("bob"));

        std::fs::remove_file(&path).ok();
    }
}
