//! MaxMind Update Fetcher
//!
//! Implements DatasetFetcher against the MaxMind database update endpoint.

use crate::adapters::outbound::gzip::{gunzip, is_gzip};
use crate::domain::errors::FetchError;
use crate::domain::ports::DatasetFetcher;
use crate::domain::value_objects::{Credentials, Edition};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

/// Public MaxMind update server.
pub const DEFAULT_UPDATE_URL: &str = "https://updates.maxmind.com";

/// Downloads databases using account id / license key basic auth.
///
/// The endpoint serves the raw MMDB gzip-compressed; the payload is
/// decompressed before being handed to the decoder.
pub struct MaxMindFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl MaxMindFetcher {
    /// Create a fetcher with its own HTTP client.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("geoipd/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Download URL for an edition.
    pub fn update_url(&self, edition: &Edition) -> String {
        format!(
            "{}/geoip/databases/{}/update",
            self.base_url.trim_end_matches('/'),
            edition
        )
    }
}

#[async_trait]
impl DatasetFetcher for MaxMindFetcher {
    async fn fetch(
        &self,
        edition: &Edition,
        credentials: &Credentials,
    ) -> Result<Vec<u8>, FetchError> {
        let url = self.update_url(edition);
        tracing::debug!("GET {}", url);

        let resp = self
            .client
            .get(&url)
            .basic_auth(&credentials.account_id, Some(&credentials.license_key))
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::AuthFailed(status.as_u16()));
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if is_gzip(&body) {
            gunzip(&body)
        } else {
            tracing::warn!("update payload is not gzip-compressed, using it as-is");
            Ok(body.to_vec())
        }
    }
}
