//! In-memory datasets and scripted collaborators for unit tests.

use crate::domain::errors::{DecodeError, FetchError, InstallError, LookupError};
use crate::domain::ports::{DatasetDecoder, DatasetFetcher, GeoDataset};
use crate::domain::{Credentials, DatasetInfo, Edition, GeoRecord};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Dataset backed by a plain map.
pub struct StaticDataset {
    name: String,
    records: HashMap<IpAddr, GeoRecord>,
    invalid: Option<String>,
    faulty: bool,
}

impl StaticDataset {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            records: HashMap::new(),
            invalid: None,
            faulty: false,
        }
    }

    pub fn with(mut self, ip: &str, record: GeoRecord) -> Self {
        self.records.insert(ip.parse().unwrap(), record);
        self
    }

    /// Fails validation at install time.
    pub fn invalid(mut self, reason: &str) -> Self {
        self.invalid = Some(reason.to_string());
        self
    }

    /// Reports a backend fault on every lookup.
    pub fn faulty(mut self) -> Self {
        self.faulty = true;
        self
    }

    pub fn into_arc(self) -> Arc<dyn GeoDataset> {
        Arc::new(self)
    }
}

impl GeoDataset for StaticDataset {
    fn lookup(&self, ip: IpAddr) -> Result<GeoRecord, LookupError> {
        if self.faulty {
            return Err(LookupError::Backend("corrupt search tree".to_string()));
        }
        self.records.get(&ip).cloned().ok_or(LookupError::NotFound)
    }

    fn info(&self) -> DatasetInfo {
        DatasetInfo::in_memory(self.name.clone())
    }

    fn validate(&self) -> Result<(), InstallError> {
        match &self.invalid {
            Some(reason) => Err(InstallError::InvalidDataset(reason.clone())),
            None => Ok(()),
        }
    }
}

/// A record whose every field is derived from `tag`, so a mix of two
/// datasets inside one record is detectable.
pub fn tagged_record(tag: &str, n: f64) -> GeoRecord {
    GeoRecord {
        country_code: Some(tag.to_string()),
        country_name: Some(format!("{tag}-country")),
        continent: Some(format!("{tag}-continent")),
        region_code: Some(format!("{tag}-rc")),
        region_name: Some(format!("{tag}-region")),
        city: Some(format!("{tag}-city")),
        postal_code: Some(format!("{tag}-zip")),
        time_zone: Some(format!("{tag}/Zone")),
        latitude: Some(n),
        longitude: Some(-n),
        metro_code: Some(n as u16),
    }
}

/// Fetcher replaying a fixed script of results. A trailing `Ok` is
/// repeated forever; errors are handed out once.
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<Vec<u8>, FetchError>>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(script: Vec<Result<Vec<u8>, FetchError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatasetFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        _edition: &Edition,
        _credentials: &Credentials,
    ) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock();
        if script.len() == 1 {
            if let Some(Ok(bytes)) = script.front() {
                return Ok(bytes.clone());
            }
        }
        script
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Network("script exhausted".to_string())))
    }
}

/// Fetcher that never completes.
pub struct HangingFetcher;

#[async_trait]
impl DatasetFetcher for HangingFetcher {
    async fn fetch(&self, _: &Edition, _: &Credentials) -> Result<Vec<u8>, FetchError> {
        std::future::pending().await
    }
}

/// Decodes `b"<tag>"` into a dataset mapping 1.2.3.4 to `tagged_record(tag)`.
///
/// `b"garbage"` fails decoding, `b"invalid"` decodes into a dataset that
/// fails validation.
pub struct TagDecoder;

impl DatasetDecoder for TagDecoder {
    fn decode(&self, raw: Vec<u8>) -> Result<Arc<dyn GeoDataset>, DecodeError> {
        let tag = String::from_utf8(raw)
            .map_err(|e| DecodeError::MalformedData(e.to_string()))?;
        match tag.as_str() {
            "garbage" => Err(DecodeError::MalformedData("no metadata marker".to_string())),
            "invalid" => Ok(StaticDataset::new("invalid").invalid("wrong edition").into_arc()),
            _ => Ok(StaticDataset::new(&tag)
                .with("1.2.3.4", tagged_record(&tag, 1.0))
                .into_arc()),
        }
    }
}
