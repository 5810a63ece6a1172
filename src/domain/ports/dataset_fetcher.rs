//! Dataset Fetcher Port
//!
//! Defines the interface for obtaining the raw bytes of a database.

use crate::domain::errors::FetchError;
use crate::domain::value_objects::{Credentials, Edition};
use async_trait::async_trait;

/// Source of raw (uncompressed) database bytes.
///
/// This is an outbound port. Implementations may download from the
/// MaxMind update server or read a local file.
#[async_trait]
pub trait DatasetFetcher: Send + Sync {
    /// Fetch a complete database for the given edition.
    async fn fetch(&self, edition: &Edition, credentials: &Credentials)
        -> Result<Vec<u8>, FetchError>;
}
