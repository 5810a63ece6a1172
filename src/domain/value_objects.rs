//! Value Objects - Immutable domain primitives
//!
//! Value objects are identified by their value rather than identity.
//! They are immutable and can be freely shared.

use std::fmt;

/// Database edition requested from the update server.
///
/// MaxMind names editions like "GeoLite2-City" or "GeoIP2-Country"; the
/// name doubles as the `database_type` recorded inside the MMDB metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edition(String);

impl Edition {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the edition carries city-level data (city, postal, subdivisions).
    pub fn has_city_data(&self) -> bool {
        self.0.to_ascii_lowercase().contains("city")
    }
}

impl Default for Edition {
    fn default() -> Self {
        Self::new("GeoLite2-City")
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Account credentials for the update server.
///
/// The license key is never printed; `Debug` redacts it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub account_id: String,
    pub license_key: String,
}

impl Credentials {
    pub fn new(account_id: impl Into<String>, license_key: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            license_key: license_key.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account_id", &self.account_id)
            .field("license_key", &"<redacted>")
            .finish()
    }
}
