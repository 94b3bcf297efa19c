//! Configuration module for Roost

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Auto-refresh interval in seconds (0 = manual only)
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Page size for list reads from the cache
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,

    /// Capacity of the per-address summary-fetcher cache
    #[serde(default = "default_summary_cap")]
    pub summary_cap: usize,

    /// Age in hours after which cached records may be evicted
    #[serde(default = "default_cache_max_age_hours")]
    pub cache_max_age_hours: u64,
}

fn default_base_url() -> String {
    crate::api::http::DEFAULT_BASE_URL.to_string()
}

fn default_refresh_interval() -> u64 {
    0 // Manual refresh by default
}

fn default_page_limit() -> usize {
    crate::fetch::DEFAULT_PAGE_LIMIT
}

fn default_summary_cap() -> usize {
    crate::fetch::DEFAULT_SUMMARY_CAP
}

fn default_cache_max_age_hours() -> u64 {
    24 * 7
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            refresh_interval_secs: default_refresh_interval(),
            page_limit: default_page_limit(),
            summary_cap: default_summary_cap(),
            cache_max_age_hours: default_cache_max_age_hours(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        crate::paths::config_path()
    }

    /// Load config from the default path or create default
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from(&path)
    }

    /// Load config from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.page_limit, crate::fetch::DEFAULT_PAGE_LIMIT);
        assert_eq!(config.refresh_interval_secs, 0);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.page_limit = 10;
        config.refresh_interval_secs = 300;
        config.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.page_limit, 10);
        assert_eq!(reloaded.refresh_interval_secs, 300);
    }
}
