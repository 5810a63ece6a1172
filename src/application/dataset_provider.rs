//! Dataset Provider - fetch and decode a complete dataset
//!
//! Composes a fetcher and a decoder into the single long-running
//! operation of the service: obtaining a fresh decoded dataset.

use crate::domain::errors::{DecodeError, FetchError, RefreshError};
use crate::domain::ports::{DatasetDecoder, DatasetFetcher, GeoDataset};
use crate::domain::value_objects::{Credentials, Edition};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Produces decoded datasets for one edition.
pub struct DatasetProvider {
    fetcher: Arc<dyn DatasetFetcher>,
    decoder: Arc<dyn DatasetDecoder>,
    edition: Edition,
    credentials: Credentials,
    fetch_timeout: Duration,
}

impl DatasetProvider {
    pub fn new(
        fetcher: Arc<dyn DatasetFetcher>,
        decoder: Arc<dyn DatasetDecoder>,
        edition: Edition,
        credentials: Credentials,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            decoder,
            edition,
            credentials,
            fetch_timeout,
        }
    }

    pub fn edition(&self) -> &Edition {
        &self.edition
    }

    /// Fetch and decode a new dataset.
    ///
    /// The fetch is bounded by the configured timeout; decoding happens on
    /// a blocking thread so request workers are not starved.
    pub async fn load(&self) -> Result<Arc<dyn GeoDataset>, RefreshError> {
        tracing::info!("starting database download (edition: '{}')", self.edition);
        let started = Instant::now();

        let raw = tokio::time::timeout(
            self.fetch_timeout,
            self.fetcher.fetch(&self.edition, &self.credentials),
        )
        .await
        .map_err(|_| FetchError::Timeout(self.fetch_timeout))??;

        tracing::info!(
            "download finished, bytes={} elapsed_ms={}",
            raw.len(),
            started.elapsed().as_millis()
        );

        let decoder = Arc::clone(&self.decoder);
        let dataset = tokio::task::spawn_blocking(move || decoder.decode(raw))
            .await
            .map_err(|e| DecodeError::MalformedData(format!("decoder task failed: {}", e)))??;

        Ok(dataset)
    }
}
