//! Domain Entities - Core business objects
//!
//! These entities represent the core concepts of the geolocation domain.
//! They have no external dependencies and contain only business logic.

use serde::Serialize;

/// Geolocation of a single IP address.
///
/// Every field is optional: the amount of data depends on the database
/// edition. A country-only edition never carries city, postal or
/// subdivision data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeoRecord {
    /// Country code (ISO 3166-1 alpha-2: BR, US, FR, etc)
    pub country_code: Option<String>,
    /// English country name
    pub country_name: Option<String>,
    /// English continent name
    pub continent: Option<String>,
    /// ISO code of the first (largest) subdivision
    pub region_code: Option<String>,
    /// English name of the first subdivision
    pub region_name: Option<String>,
    /// English city name
    pub city: Option<String>,
    pub postal_code: Option<String>,
    /// IANA time zone (e.g. "America/Chicago")
    pub time_zone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// US metro code (DMA); only present for US locations
    pub metro_code: Option<u16>,
}

impl GeoRecord {
    /// Record carrying only a country code.
    pub fn with_country(code: impl Into<String>) -> Self {
        Self {
            country_code: Some(code.into()),
            ..Self::default()
        }
    }
}

/// Descriptive metadata of a decoded dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetInfo {
    /// Database type as recorded by the producer (e.g. "GeoLite2-City")
    pub database_type: String,
    /// Unix timestamp of the database build
    pub build_epoch: u64,
    /// 4 for IPv4-only databases, 6 for databases covering both families
    pub ip_version: u16,
    pub node_count: u32,
    /// Search tree record size in bits (24, 28 or 32)
    pub record_size: u16,
    pub binary_format_major_version: u16,
}

impl DatasetInfo {
    /// Metadata for datasets that do not come from an MMDB file.
    pub fn in_memory(database_type: impl Into<String>) -> Self {
        Self {
            database_type: database_type.into(),
            build_epoch: 0,
            ip_version: 6,
            node_count: 0,
            record_size: 0,
            binary_format_major_version: 0,
        }
    }
}
