//! Application Layer
//!
//! Use cases orchestrating the domain ports: the hot-swappable snapshot
//! store, the dataset provider and the refresh scheduler.

mod dataset_provider;
mod refresh_scheduler;
mod snapshot_store;

pub use dataset_provider::DatasetProvider;
pub use refresh_scheduler::{
    RefreshOutcome, RefreshScheduler, RefreshState, RefreshStats, RefreshStatus,
};
pub use snapshot_store::{Snapshot, SnapshotStore};

use crate::domain::errors::RefreshError;
use std::sync::Arc;

/// Load the startup dataset and build the store serving it.
///
/// Any failure here means there is nothing to serve; the caller must not
/// start accepting lookups.
pub async fn bootstrap(provider: &DatasetProvider) -> Result<Arc<SnapshotStore>, RefreshError> {
    let dataset = provider.load().await?;
    let store = SnapshotStore::new(dataset)?;
    tracing::info!(
        "initial database installed (edition: '{}', type: '{}')",
        provider.edition(),
        store.current().info().database_type
    );
    Ok(Arc::new(store))
}
