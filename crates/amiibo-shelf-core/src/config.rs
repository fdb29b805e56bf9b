//! Application configuration management.
//!
//! Configuration is stored at `~/.config/amiibo-shelf/config.json`. The
//! remote endpoints can also be set with `AMIIBO_SHELF_API_URL` and
//! `AMIIBO_SHELF_SHARE_URL`, which take precedence over the file.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_API_BASE_URL;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "amiibo-shelf";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Page that opens share links
pub const DEFAULT_SHARE_BASE_URL: &str = "https://amiibo-shelf.github.io/";

pub const API_URL_ENV: &str = "AMIIBO_SHELF_API_URL";
pub const SHARE_URL_ENV: &str = "AMIIBO_SHELF_SHARE_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub share_base_url: Option<String>,
    /// Upper bound on the cache directory's size
    pub cache_quota_bytes: Option<u64>,
}

impl Config {
    /// Load the config file with environment overrides applied.
    pub fn load() -> Result<Self> {
        Ok(Self::load_file()?.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Load the config file alone, for editing and saving back.
    pub fn load_file() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
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

    fn with_env_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = var(API_URL_ENV).filter(|v| !v.is_empty()) {
            self.api_base_url = Some(url);
        }
        if let Some(url) = var(SHARE_URL_ENV).filter(|v| !v.is_empty()) {
            self.share_base_url = Some(url);
        }
        self
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

    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn share_base_url(&self) -> &str {
        self.share_base_url
            .as_deref()
            .unwrap_or(DEFAULT_SHARE_BASE_URL)
    }
}
