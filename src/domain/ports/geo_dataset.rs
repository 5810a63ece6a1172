//! GeoIP Dataset Port
//!
//! Defines the interface of a decoded, queryable geolocation database.

use crate::domain::entities::{DatasetInfo, GeoRecord};
use crate::domain::errors::{InstallError, LookupError};
use std::net::IpAddr;

/// An immutable, fully decoded geolocation database.
///
/// This is an outbound port that abstracts the database format.
/// Implementations are never mutated after construction, so they can be
/// shared across any number of concurrent readers without locking.
pub trait GeoDataset: Send + Sync {
    /// Resolve an IP address to its geolocation record.
    ///
    /// Returns `LookupError::NotFound` when the address has no entry and
    /// `LookupError::Backend` when the database itself is faulty.
    fn lookup(&self, ip: IpAddr) -> Result<GeoRecord, LookupError>;

    /// Metadata describing this dataset.
    fn info(&self) -> DatasetInfo;

    /// Checks run right before the dataset becomes active.
    fn validate(&self) -> Result<(), InstallError> {
        Ok(())
    }
}
