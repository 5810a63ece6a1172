//! Dataset Decoder Port

use crate::domain::errors::DecodeError;
use crate::domain::ports::GeoDataset;
use std::sync::Arc;

/// Turns raw database bytes into a queryable dataset.
///
/// Decoding is CPU-bound and is run on a blocking thread by the caller.
pub trait DatasetDecoder: Send + Sync {
    fn decode(&self, raw: Vec<u8>) -> Result<Arc<dyn GeoDataset>, DecodeError>;
}
