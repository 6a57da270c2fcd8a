//! User configuration for Trackboard
//!
//! This module handles user-configurable settings stored in settings.json.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::Paths;

/// User configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConfig {
    /// Server ID used as the password hashing salt
    #[serde(default)]
    pub server_id: String,

    /// Let uploads skip the 24h cooldown. Never applies to votes.
    #[serde(default)]
    pub bypass_upload_limit: bool,

    /// Storage zone API endpoint
    #[serde(default = "default_storage_endpoint")]
    pub storage_endpoint: String,

    /// Storage zone name
    #[serde(default = "default_storage_zone")]
    pub storage_zone: String,

    /// Storage zone access key
    #[serde(default)]
    pub storage_access_key: String,

    /// Public CDN base URL that serves uploaded files
    #[serde(default = "default_cdn_base_url")]
    pub cdn_base_url: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            server_id: String::new(),
            bypass_upload_limit: false,
            storage_endpoint: default_storage_endpoint(),
            storage_zone: default_storage_zone(),
            storage_access_key: String::new(),
            cdn_base_url: default_cdn_base_url(),
        }
    }
}

impl UserConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let paths = Paths::get()?;
        let settings_path = paths.settings_path();

        if settings_path.exists() {
            let content =
                std::fs::read_to_string(&settings_path).context("Failed to read settings file")?;
            let config: UserConfig =
                serde_json::from_str(&content).context("Failed to parse settings file")?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let paths = Paths::get()?;
        let settings_path = paths.settings_path();

        let content = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(&settings_path, content).context("Failed to write settings file")?;

        Ok(())
    }

    /// Sync settings from environment variables.
    ///
    /// This runs on every startup (not just first-run) so docker users can
    /// change the env vars between restarts and have them take effect.
    pub fn apply_env_overrides(&mut self) -> bool {
        let mut changed = false;

        if let Ok(v) = std::env::var("BYPASS_LIMIT_FOR_UPLOAD") {
            let bypass = v == "true";
            if bypass != self.bypass_upload_limit {
                self.bypass_upload_limit = bypass;
                changed = true;
            }
        }

        if let Ok(v) = std::env::var("BUNNYNET_ACCESS_TOKEN") {
            if !v.is_empty() && v != self.storage_access_key {
                self.storage_access_key = v;
                changed = true;
            }
        }

        if let Ok(v) = std::env::var("STORAGE_ZONE") {
            if !v.is_empty() && v != self.storage_zone {
                self.storage_zone = v;
                changed = true;
            }
        }

        if let Ok(v) = std::env::var("CDN_BASE_URL") {
            if !v.is_empty() && v != self.cdn_base_url {
                self.cdn_base_url = v;
                changed = true;
            }
        }

        changed
    }
}

// Default value functions for serde

fn default_storage_endpoint() -> String {
    "https://storage.bunnycdn.com".to_string()
}

fn default_storage_zone() -> String {
    "trackboard".to_string()
}

fn default_cdn_base_url() -> String {
    "https://trackboard.b-cdn.net".to_string()
}
