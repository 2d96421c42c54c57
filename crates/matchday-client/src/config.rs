use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use matchday::ProtocolConfig;
use serde::{Deserialize, Serialize};

/// Driver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Settings handed to the protocol engine.
    pub protocol: ProtocolConfig,
    /// Largest frame the reader accepts, terminator included. Default: 1 MiB.
    pub max_frame_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            protocol: ProtocolConfig::default(),
            max_frame_bytes: 1024 * 1024,
        }
    }
}

impl ClientConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&data)
            .with_context(|| format!("malformed config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_protocol(mut self, protocol: ProtocolConfig) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
        self.max_frame_bytes = max_frame_bytes;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.protocol.validate()?;
        ensure!(self.max_frame_bytes > 0, "max_frame_bytes must be at least 1");
        Ok(())
    }
}
