//! Session configuration

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ChatConfig {
    /// Server host used by [`crate::ChatSession::connect`].
    pub host: String,
    pub port: u16,
    /// Maximum number of messages kept in the session log.
    pub max_messages: usize,
    /// Name shown on messages we send.
    pub display_name: String,
    /// Local user id. Generated when absent.
    pub user_id: Option<String>,
    pub connect_timeout_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            max_messages: 100,
            display_name: "Me".to_string(),
            user_id: None,
            connect_timeout_ms: 10_000,
        }
    }
}

impl ChatConfig {
    /// Parse a JSON config, filling unspecified fields with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("invalid chat config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("unable to read config file '{}'", path.display()))?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.max_messages == 0 {
            return Err(Error::InvalidConfig("max_messages must be at least 1".into()));
        }
        if self.display_name.trim().is_empty() {
            return Err(Error::InvalidConfig("display_name must not be empty".into()));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
