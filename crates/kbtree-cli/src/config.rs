//! CLI configuration management

use kbtree_sdk::auth::DEFAULT_AUTH_URL;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::CliError;

/// CLI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Tree service endpoint URL
    #[serde(default = "default_url")]
    pub url: String,
    /// Read timeout in milliseconds, unset waits forever
    #[serde(default)]
    pub read_timeout_ms: Option<u64>,
    /// Allow sending the auth token over plain http
    #[serde(default)]
    pub auth_allowed_for_http: bool,
    /// Identity provider login endpoint
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
}

fn default_url() -> String {
    "https://kbase.us/services/trees".to_string()
}

fn default_auth_url() -> String {
    DEFAULT_AUTH_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: default_url(),
            read_timeout_ms: None,
            auth_allowed_for_http: false,
            auth_url: default_auth_url(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".kbtree"))
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Load config from file or return default
    ///
    /// A missing file yields the defaults; an unreadable or malformed one is
    /// an error rather than being silently ignored.
    pub fn load() -> Result<Self, CliError> {
        match Self::config_path() {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(&path)?;
                let config = toml::from_str(&content)
                    .map_err(|e| CliError::Config(format!("{}: {}", path.display(), e)))?;
                tracing::debug!(path = %path.display(), "loaded config");
                Ok(config)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<(), CliError> {
        let path = Self::config_path()
            .ok_or_else(|| CliError::Config("Cannot determine config path".to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| CliError::Config(e.to_string()))?;
        std::fs::write(&path, content)?;
        tracing::debug!(path = %path.display(), "saved config");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.url, "https://kbase.us/services/trees");
        assert_eq!(config.read_timeout_ms, None);
        assert!(!config.auth_allowed_for_http);
        assert_eq!(config.auth_url, DEFAULT_AUTH_URL);
    }

    #[test]
    fn test_config_serialize() {
        let config = Config {
            read_timeout_ms: Some(5000),
            ..Default::default()
        };
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("url"));
        assert!(toml.contains("read_timeout_ms = 5000"));
    }

    #[test]
    fn test_config_deserialize_partial() {
        let toml = r#"
            url = "http://localhost:7047"
            auth_allowed_for_http = true
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.url, "http://localhost:7047");
        assert!(config.auth_allowed_for_http);
        assert_eq!(config.read_timeout_ms, None);
        assert_eq!(config.auth_url, DEFAULT_AUTH_URL);
    }
}
