//! Domain Errors
//!
//! Failure taxonomy shared by the snapshot store, the dataset provider
//! and the refresh scheduler.

use std::time::Duration;

/// Errors returned to lookup callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// The input is not a valid IPv4/IPv6 address.
    #[error("invalid IP address: {0:?}")]
    InvalidInput(String),
    /// Valid address without an entry in the active dataset.
    #[error("address not found in dataset")]
    NotFound,
    /// The dataset reported an internal fault while resolving the address.
    #[error("dataset lookup failed: {0}")]
    Backend(String),
}

/// Errors produced while fetching raw dataset bytes.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("authentication rejected by update server (HTTP {0})")]
    AuthFailed(u16),
    #[error("update server responded with HTTP {0}")]
    Status(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("failed to decompress dataset: {0}")]
    Decompress(#[source] std::io::Error),
    #[error("failed to read dataset file: {0}")]
    Io(#[from] std::io::Error),
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
}

/// The raw bytes could not be decoded into a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed dataset: {0}")]
    MalformedData(String),
}

/// The decoded dataset failed validation and was not installed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstallError {
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),
}

/// Everything a single refresh tick can fail with.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Install(#[from] InstallError),
}

impl RefreshError {
    /// Short label used in logs and health output.
    pub fn kind(&self) -> &'static str {
        match self {
            RefreshError::Fetch(FetchError::AuthFailed(_)) => "auth_failed",
            RefreshError::Fetch(FetchError::Timeout(_)) => "timeout",
            RefreshError::Fetch(_) => "fetch_failed",
            RefreshError::Decode(_) => "malformed_data",
            RefreshError::Install(_) => "invalid_dataset",
        }
    }
}
