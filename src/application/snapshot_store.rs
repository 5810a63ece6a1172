//! Snapshot Store - Hot-swappable dataset holder
//!
//! Holds the single active geolocation dataset and serves lookups against
//! it while allowing the whole dataset to be replaced atomically.

use crate::domain::entities::{DatasetInfo, GeoRecord};
use crate::domain::errors::{InstallError, LookupError};
use crate::domain::ports::GeoDataset;
use parking_lot::RwLock;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::SystemTime;

/// One installed dataset together with its install generation.
#[derive(Clone)]
pub struct Snapshot {
    pub dataset: Arc<dyn GeoDataset>,
    /// 1 for the startup dataset, incremented on every successful install
    pub version: u64,
    pub installed_at: SystemTime,
}

impl Snapshot {
    pub fn info(&self) -> DatasetInfo {
        self.dataset.info()
    }
}

/// Owner of the currently active dataset.
///
/// The lock guards the dataset *reference* only. Readers hold the shared
/// lock just long enough to clone the `Arc`, then resolve the address
/// against the captured dataset with no lock held. Writers hold the
/// exclusive lock just long enough to swap the reference, so an install
/// never waits on a running lookup and vice versa.
///
/// A store can only be built from a dataset, so once it exists there is
/// always exactly one active dataset.
pub struct SnapshotStore {
    active: RwLock<Snapshot>,
}

impl SnapshotStore {
    /// Create a store serving `initial`.
    ///
    /// Fails if `initial` does not pass validation.
    pub fn new(initial: Arc<dyn GeoDataset>) -> Result<Self, InstallError> {
        initial.validate()?;
        Ok(Self {
            active: RwLock::new(Snapshot {
                dataset: initial,
                version: 1,
                installed_at: SystemTime::now(),
            }),
        })
    }

    /// Replace the active dataset.
    ///
    /// Concurrent lookups observe either the previous dataset or the new
    /// one in its entirety. On validation failure the previous dataset
    /// stays active. Returns the version of the newly active snapshot.
    pub fn install(&self, dataset: Arc<dyn GeoDataset>) -> Result<u64, InstallError> {
        dataset.validate()?;

        let replaced;
        let version;
        {
            let mut active = self.active.write();
            version = active.version + 1;
            replaced = std::mem::replace(
                &mut *active,
                Snapshot {
                    dataset,
                    version,
                    installed_at: SystemTime::now(),
                },
            );
        }
        // The old dataset is freed here, or by the last lookup still using it.
        drop(replaced);

        tracing::debug!("snapshot installed, version={}", version);
        Ok(version)
    }

    /// Resolve a textual IP address against the active dataset.
    ///
    /// Unparseable input is rejected with `LookupError::InvalidInput`
    /// before the dataset is touched.
    pub fn lookup(&self, ip: &str) -> Result<GeoRecord, LookupError> {
        let addr: IpAddr = ip
            .trim()
            .parse()
            .map_err(|_| LookupError::InvalidInput(ip.to_string()))?;
        self.lookup_addr(addr)
    }

    /// Resolve an already parsed address against the active dataset.
    pub fn lookup_addr(&self, addr: IpAddr) -> Result<GeoRecord, LookupError> {
        let dataset = self.dataset();
        dataset.lookup(addr)
    }

    /// Clone of the active snapshot.
    pub fn current(&self) -> Snapshot {
        self.active.read().clone()
    }

    /// Version of the active snapshot.
    pub fn version(&self) -> u64 {
        self.active.read().version
    }

    fn dataset(&self) -> Arc<dyn GeoDataset> {
        Arc::clone(&self.active.read().dataset)
    }
}
