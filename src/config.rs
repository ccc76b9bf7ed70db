//! Configuration module for roost

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::Instance;
use crate::paths;

/// Well-known hosts offered as login suggestions.
pub const SUGGESTED_HOSTS: &[&str] = &["mastodon.social", "mastodon.online"];

/// Client configuration, persisted as TOML under the roost config directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Instance to talk to.
    #[serde(default = "default_instance")]
    pub instance: Instance,

    /// Client name sent at application registration.
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// Website sent at application registration.
    #[serde(default = "default_website")]
    pub website: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Statuses requested per timeline page.
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,
}

fn default_instance() -> Instance {
    Instance::new("mastodon.social")
}

fn default_client_name() -> String {
    "roost".to_string()
}

fn default_website() -> String {
    "https://github.com/roost-client/roost".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_limit() -> usize {
    40
}

impl Default for Config {
    fn default() -> Self {
        Self {
            instance: default_instance(),
            client_name: default_client_name(),
            website: default_website(),
            timeout_secs: default_timeout_secs(),
            page_limit: default_page_limit(),
        }
    }
}

impl Config {
    /// Load config from the default path or fall back to defaults.
    pub fn load() -> Result<Self> {
        let path = paths::config_path()?;
        Self::load_from(&path)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| Error::Storage(format!("failed to read config file: {e}")))?;
            toml::from_str(&content)
                .map_err(|e| Error::Storage(format!("failed to parse config file: {e}")))
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = paths::config_path()?;
        self.save_to(&path)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("failed to create config directory: {e}")))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Storage(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, content)
            .map_err(|e| Error::Storage(format!("failed to write config file: {e}")))?;

        Ok(())
    }

    /// Request timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
