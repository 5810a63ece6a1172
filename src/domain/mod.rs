//! Domain Layer
//!
//! Entities, value objects, errors and the ports the application
//! layer depends on.

pub mod entities;
pub mod errors;
pub mod ports;
pub mod value_objects;

pub use entities::{DatasetInfo, GeoRecord};
pub use errors::{DecodeError, FetchError, InstallError, LookupError, RefreshError};
pub use value_objects::{Credentials, Edition};
