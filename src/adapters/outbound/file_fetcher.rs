//! Local File Fetcher
//!
//! Implements DatasetFetcher by reading a database from disk, for offline
//! deployments and development.

use crate::adapters::outbound::gzip::{gunzip, is_gzip};
use crate::domain::errors::FetchError;
use crate::domain::ports::DatasetFetcher;
use crate::domain::value_objects::{Credentials, Edition};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Reads `.mmdb` files (optionally gzip-compressed).
///
/// The file is re-read on every fetch, so replacing it on disk is picked
/// up by the next refresh tick.
pub struct FileFetcher {
    path: PathBuf,
}

impl FileFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DatasetFetcher for FileFetcher {
    async fn fetch(
        &self,
        _edition: &Edition,
        _credentials: &Credentials,
    ) -> Result<Vec<u8>, FetchError> {
        let bytes = tokio::fs::read(&self.path).await?;
        if is_gzip(&bytes) {
            gunzip(&bytes)
        } else {
            Ok(bytes)
        }
    }
}
