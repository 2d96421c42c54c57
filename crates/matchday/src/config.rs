use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Protocol-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Sent as `accept-version` in CONNECT. Default: `1.2`.
    pub accept_version: String,
    /// Virtual host sent as `host` in CONNECT. Default: `stomp.cs.bgu.ac.il`.
    pub host: String,
    /// Prepended to a game name to form its destination. Default: `/`.
    pub destination_prefix: String,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            accept_version: "1.2".to_string(),
            host: "stomp.cs.bgu.ac.il".to_string(),
            destination_prefix: "/".to_string(),
        }
    }
}

impl ProtocolConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&data).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_accept_version(mut self, version: impl Into<String>) -> Self {
        self.accept_version = version.into();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_destination_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.destination_prefix = prefix.into();
        self
    }

    /// Checks:
    /// - `accept_version` is non-empty
    /// - `host` is non-empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.accept_version.trim().is_empty() {
            return Err(ConfigError::Invalid {
                reason: "accept_version must not be empty".to_string(),
            });
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid {
                reason: "host must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn destination(&self, game: &str) -> String {
        format!("{}{}", self.destination_prefix, game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ProtocolConfig::default();
        assert_eq!(config.accept_version, "1.2");
        assert_eq!(config.destination("a_b"), "/a_b");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ProtocolConfig =
            serde_json::from_str(r#"{"destination_prefix": "/topic/"}"#).unwrap();
        assert_eq!(config.destination("a_b"), "/topic/a_b");
        assert_eq!(config.host, "stomp.cs.bgu.ac.il");
    }

    #[test]
    fn validate_rejects_empty_host() {
        let err = ProtocolConfig::default().with_host(" ").validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid configuration: host must not be empty");
    }

    #[test]
    fn load_reads_json_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("matchday.json");
        fs::write(&path, r#"{"host": "localhost", "accept_version": "1.1"}"#).unwrap();

        let config = ProtocolConfig::load(&path).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.accept_version, "1.1");
    }

    #[test]
    fn load_rejects_invalid_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("matchday.json");
        fs::write(&path, r#"{"accept_version": ""}"#).unwrap();

        assert!(matches!(
            ProtocolConfig::load(&path),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
