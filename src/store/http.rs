//! REST client for a remote key-value store service

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::debug;

use super::{KvStore, StoreError};
use crate::config::Config;
use crate::util::time::DEFAULT_STORE_TIMEOUT_MS;

/// Client for the `/kv/{key}` API served by the `nexus-defense` binary
#[derive(Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
}

impl HttpStore {
    pub fn new(config: &Config) -> Result<Self, StoreError> {
        Self::with_timeout(
            &config.store_url,
            Duration::from_millis(config.store_timeout_ms),
        )
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, StoreError> {
        Self::with_timeout(base_url, Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS))
    }

    /// Every request, body included, fails once `timeout` has passed
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the API URL for a key
    fn key_url(&self, key: &str) -> String {
        format!("{}/kv/{}", self.base_url, key)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

impl KvStore for HttpStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let response = self.client.get(self.key_url(key)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(key, "Key not found");
            return Ok(None);
        }

        let response = Self::check(response).await?;
        Ok(Some(response.text().await?))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let response = self
            .client
            .put(self.key_url(key))
            .header("Content-Type", "application/json")
            .body(value)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let response = self.client.delete(self.key_url(key)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }

        Self::check(response).await?;
        Ok(())
    }
}
