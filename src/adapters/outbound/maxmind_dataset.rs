//! MaxMind GeoIP Dataset
//!
//! Implements GeoDataset and DatasetDecoder on top of the `maxminddb`
//! reader for GeoLite2/GeoIP2 databases.

use crate::domain::entities::{DatasetInfo, GeoRecord};
use crate::domain::errors::{DecodeError, InstallError, LookupError};
use crate::domain::ports::{DatasetDecoder, GeoDataset};
use crate::domain::value_objects::Edition;
use maxminddb::{geoip2, MaxMindDBError, Reader};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Arc;

/// Language used for all names in a record.
const LANGUAGE: &str = "en";

/// Bytes between the search tree and the data section.
const DATA_SECTION_SEPARATOR: usize = 16;

/// A decoded MaxMind database held in memory.
pub struct MaxMindDataset {
    reader: Reader<Vec<u8>>,
    size: usize,
    expected_edition: Option<Edition>,
}

impl MaxMindDataset {
    /// Decode a complete, uncompressed MMDB file.
    pub fn from_bytes(raw: Vec<u8>) -> Result<Self, DecodeError> {
        let size = raw.len();
        let reader =
            Reader::from_source(raw).map_err(|e| DecodeError::MalformedData(e.to_string()))?;
        Ok(Self {
            reader,
            size,
            expected_edition: None,
        })
    }

    /// Require the database type to match `edition` at install time.
    pub fn expecting(mut self, edition: Edition) -> Self {
        self.expected_edition = Some(edition);
        self
    }

    fn to_record(city: geoip2::City<'_>) -> GeoRecord {
        let (region_code, region_name) = city
            .subdivisions
            .and_then(|divs| divs.into_iter().next())
            .map(|div| (div.iso_code.map(String::from), english(div.names)))
            .unwrap_or((None, None));

        let (country_code, country_name) = city
            .country
            .map(|country| (country.iso_code.map(String::from), english(country.names)))
            .unwrap_or((None, None));

        let location = city.location;

        GeoRecord {
            country_code,
            country_name,
            continent: city.continent.and_then(|continent| english(continent.names)),
            region_code,
            region_name,
            city: city.city.and_then(|city| english(city.names)),
            postal_code: city.postal.and_then(|postal| postal.code.map(String::from)),
            time_zone: location
                .as_ref()
                .and_then(|loc| loc.time_zone.map(String::from)),
            latitude: location.as_ref().and_then(|loc| loc.latitude),
            longitude: location.as_ref().and_then(|loc| loc.longitude),
            metro_code: location.as_ref().and_then(|loc| loc.metro_code),
        }
    }
}

fn english(names: Option<BTreeMap<&str, &str>>) -> Option<String> {
    names.and_then(|names| names.get(LANGUAGE).map(|name| name.to_string()))
}

impl GeoDataset for MaxMindDataset {
    fn lookup(&self, ip: IpAddr) -> Result<GeoRecord, LookupError> {
        match self.reader.lookup::<geoip2::City>(ip) {
            Ok(city) => Ok(Self::to_record(city)),
            Err(MaxMindDBError::AddressNotFoundError(_)) => Err(LookupError::NotFound),
            Err(e) => Err(LookupError::Backend(e.to_string())),
        }
    }

    fn info(&self) -> DatasetInfo {
        let metadata = &self.reader.metadata;
        DatasetInfo {
            database_type: metadata.database_type.clone(),
            build_epoch: metadata.build_epoch,
            ip_version: metadata.ip_version,
            node_count: metadata.node_count,
            record_size: metadata.record_size,
            binary_format_major_version: metadata.binary_format_major_version,
        }
    }

    fn validate(&self) -> Result<(), InstallError> {
        let metadata = &self.reader.metadata;
        let invalid = |reason: String| Err(InstallError::InvalidDataset(reason));

        if metadata.binary_format_major_version != 2 {
            return invalid(format!(
                "unsupported binary format version {}",
                metadata.binary_format_major_version
            ));
        }
        if !matches!(metadata.record_size, 24 | 28 | 32) {
            return invalid(format!("unsupported record size {}", metadata.record_size));
        }
        if !matches!(metadata.ip_version, 4 | 6) {
            return invalid(format!("unsupported ip version {}", metadata.ip_version));
        }
        if metadata.node_count == 0 {
            return invalid("empty search tree".to_string());
        }

        let tree_size = metadata.node_count as usize * metadata.record_size as usize / 4;
        if tree_size + DATA_SECTION_SEPARATOR > self.size {
            return invalid(format!(
                "search tree of {} bytes exceeds database size {}",
                tree_size, self.size
            ));
        }

        if let Some(expected) = &self.expected_edition {
            if metadata.database_type != expected.as_str() {
                return invalid(format!(
                    "database type '{}' does not match edition '{}'",
                    metadata.database_type, expected
                ));
            }
        }

        Ok(())
    }
}

/// Decoder producing `MaxMindDataset`s.
#[derive(Debug, Clone, Default)]
pub struct MaxMindDecoder {
    expected_edition: Option<Edition>,
}

impl MaxMindDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoded datasets must carry this edition as their database type.
    pub fn expecting(edition: Edition) -> Self {
        Self {
            expected_edition: Some(edition),
        }
    }
}

impl DatasetDecoder for MaxMindDecoder {
    fn decode(&self, raw: Vec<u8>) -> Result<Arc<dyn GeoDataset>, DecodeError> {
        let mut dataset = MaxMindDataset::from_bytes(raw)?;
        if let Some(edition) = &self.expected_edition {
            dataset = dataset.expecting(edition.clone());
        }
        tracing::debug!(
            "decoded database type={} nodes={}",
            dataset.reader.metadata.database_type,
            dataset.reader.metadata.node_count
        );
        Ok(Arc::new(dataset))
    }
}
