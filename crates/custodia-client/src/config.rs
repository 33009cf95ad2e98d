//! Configuration management for custodia.
//!
//! Loads configuration from ${CUSTODIA_HOME}/config.toml with sensible
//! defaults. The backend base URL can be overridden with CUSTODIA_API_URL.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub mod paths {
    //! Path resolution for custodia configuration and state directories.
    //!
    //! CUSTODIA_HOME resolution order:
    //! 1. CUSTODIA_HOME environment variable (if set)
    //! 2. ~/.config/custodia (default)

    use std::path::PathBuf;

    /// Returns the custodia home directory.
    pub fn custodia_home() -> PathBuf {
        if let Ok(home) = std::env::var("CUSTODIA_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("custodia"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        custodia_home().join("config.toml")
    }

    /// Returns the path to the persisted session file.
    pub fn session_path() -> PathBuf {
        custodia_home().join("session.json")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend API base URL, e.g. `http://localhost:5002/api`
    pub api_base_url: String,

    /// How long a cached listing stays fresh before a re-fetch (seconds)
    pub stale_time_secs: u64,

    /// Forwarder contract address included in transfer requests
    pub token_forwarder_address: Option<String>,
}

impl Config {
    const DEFAULT_API_BASE_URL: &str = "http://localhost:5002/api";
    const DEFAULT_STALE_TIME_SECS: u64 = 300;

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))?
        } else {
            Config::default()
        };

        // An environment-provided base URL beats the config file.
        if let Ok(env_url) = std::env::var("CUSTODIA_API_URL") {
            let trimmed = env_url.trim();
            if !trimmed.is_empty() {
                config.api_base_url = trimmed.to_string();
            }
        }

        Self::validate_url(&config.api_base_url)?;
        Ok(config)
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.stale_time_secs)
    }

    /// Validates that the base URL is well-formed http(s).
    fn validate_url(raw: &str) -> Result<()> {
        let parsed = url::Url::parse(raw).with_context(|| format!("Invalid base URL: {raw}"))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            anyhow::bail!("Base URL must be http or https, got: {raw}");
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: Self::DEFAULT_API_BASE_URL.to_string(),
            stale_time_secs: Self::DEFAULT_STALE_TIME_SECS,
            token_forwarder_address: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "http://localhost:5002/api");
        assert_eq!(config.stale_time_secs, 300);
        assert!(config.token_forwarder_address.is_none());
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.api_base_url, Config::DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_load_from_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_base_url = \"http://10.0.0.1:5002/api\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_base_url, "http://10.0.0.1:5002/api");
        assert_eq!(config.stale_time_secs, Config::DEFAULT_STALE_TIME_SECS);
    }

    #[test]
    fn test_rejects_non_http_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_base_url = \"ftp://backend\"\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
