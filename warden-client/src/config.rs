//! Client configuration
//!
//! Loaded from the platform config directory with an environment override
//! for the service base URL, so the same build can point at a local dev
//! service without touching the config file.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use url::Url;

const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the configured base URL.
pub const BASE_URL_ENV: &str = "WARDEN_SERVER_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the identity service
    pub base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Application path the redirect hook points at after teardown
    pub login_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 30,
            login_path: "/login".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration, preferring the environment override, then the
    /// config file, then defaults. Never fails; a corrupt file falls back
    /// to defaults.
    pub fn load() -> Self {
        let mut config = Self::load_file().unwrap_or_default();

        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                config.base_url = url.to_string();
            }
        }

        config.base_url = normalize_base_url(&config.base_url);
        config
    }

    fn load_file() -> Option<Self> {
        let proj_dirs = ProjectDirs::from("", "warden", "warden-client")?;
        let config_path = proj_dirs.config_dir().join(CONFIG_FILE);
        if !config_path.exists() {
            return None;
        }

        let content = std::fs::read_to_string(&config_path).ok()?;
        match serde_json::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!(
                    "Ignoring corrupt config at {:?}: {}",
                    config_path,
                    e
                );
                None
            }
        }
    }

    /// Persist the configuration to the platform config directory.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(proj_dirs) = ProjectDirs::from("", "warden", "warden-client")
        {
            let config_dir = proj_dirs.config_dir();
            std::fs::create_dir_all(config_dir)?;
            let content = serde_json::to_string_pretty(self)?;
            std::fs::write(config_dir.join(CONFIG_FILE), content)?;
        }
        Ok(())
    }

    /// Config suitable for pointing at an arbitrary service, mostly tests.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            ..Self::default()
        }
    }
}

/// Strip a trailing slash and reject obviously unusable URLs, falling back
/// to the value as given when it does not parse (the first request will
/// surface the problem as a network error).
fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if Url::parse(trimmed).is_err() {
        log::warn!("Configured base URL {:?} does not parse", trimmed);
    }
    trimmed.to_string()
}
