//! geoipd Library
//!
//! This module exposes the geoipd components for use in integration tests
//! and as a library.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use application::{DatasetProvider, RefreshScheduler, RefreshStats, SnapshotStore};
pub use config::{load_config, Config};
pub use domain::entities::{DatasetInfo, GeoRecord};
pub use domain::ports::{DatasetDecoder, DatasetFetcher, GeoDataset};
pub use domain::value_objects::{Credentials, Edition};
