//! Configuration types for the Barfik client

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `api_base_url`
pub const API_BASE_URL_ENV: &str = "BARFIK_API_BASE_URL";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            cache: CacheConfig::default(),
            notifications: NotificationConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Config {
    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_BASE_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                tracing::debug!("Using API base URL from {}", API_BASE_URL_ENV);
                self.api_base_url = url.to_string();
            }
        }
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> crate::Result<()> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return Err(crate::BarfikError::Config(format!(
                "api_base_url must be an http(s) URL, got '{}'",
                self.api_base_url
            )));
        }
        Ok(())
    }
}

/// How long cached query results are served without refetching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_list_stale", with = "humantime_serde")]
    pub animals: Duration,
    #[serde(default = "default_list_stale", with = "humantime_serde")]
    pub diets: Duration,
    #[serde(default = "default_shopping_lists_stale", with = "humantime_serde")]
    pub shopping_lists: Duration,
    #[serde(default = "default_dictionaries_stale", with = "humantime_serde")]
    pub dictionaries: Duration,
    #[serde(default = "default_dashboard_stale", with = "humantime_serde")]
    pub dashboard: Duration,
    /// Applies to single-entity reads and everything not listed above
    #[serde(default, with = "humantime_serde")]
    pub default: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            animals: default_list_stale(),
            diets: default_list_stale(),
            shopping_lists: default_shopping_lists_stale(),
            dictionaries: default_dictionaries_stale(),
            dashboard: default_dashboard_stale(),
            default: Duration::ZERO,
        }
    }
}

/// Transient notification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_dismiss_after", with = "humantime_serde")]
    pub dismiss_after: Duration,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            dismiss_after: default_dismiss_after(),
        }
    }
}

/// Session and token handling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
    /// Upper bound for the refresh call; `None` waits indefinitely
    #[serde(default, with = "humantime_serde")]
    pub refresh_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_file: default_token_file(),
            refresh_timeout: None,
        }
    }
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_list_stale() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_shopping_lists_stale() -> Duration {
    Duration::from_secs(1)
}

fn default_dictionaries_stale() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_dashboard_stale() -> Duration {
    Duration::from_secs(2 * 60)
}

fn default_dismiss_after() -> Duration {
    Duration::from_secs(5)
}

fn default_token_file() -> PathBuf {
    PathBuf::from(".barfik-session.json")
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::BarfikError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
