//! bunny.net storage zone client
//!
//! Files land in a storage zone via a plain HTTP PUT and are served back
//! through the zone's CDN hostname.

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;

use super::BlobStorage;
use crate::config::UserConfig;

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

/// Storage zone client for bunny.net
pub struct BunnyStorage {
    client: reqwest::Client,
    endpoint: String,
    zone: String,
    access_key: String,
}

impl BunnyStorage {
    /// Build a client from the application settings
    pub fn from_config(config: &UserConfig) -> Self {
        Self {
            client: HTTP_CLIENT.clone(),
            endpoint: config.storage_endpoint.trim_end_matches('/').to_string(),
            zone: config.storage_zone.clone(),
            access_key: config.storage_access_key.clone(),
        }
    }
}

#[async_trait]
impl BlobStorage for BunnyStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<bool> {
        let url = format!("{}/{}{}", self.endpoint, self.zone, path);

        let response = self
            .client
            .put(&url)
            .header("AccessKey", &self.access_key)
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .context("Storage zone request failed")?;

        Ok(response.status().is_success())
    }
}
