//! Gzip helpers for compressed database payloads.

use crate::domain::errors::FetchError;
use flate2::read::GzDecoder;
use std::io::Read;

/// Gzip member header magic.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Decompress a gzip payload into memory.
pub fn gunzip(bytes: &[u8]) -> Result<Vec<u8>, FetchError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::with_capacity(bytes.len() * 2);
    decoder
        .read_to_end(&mut out)
        .map_err(FetchError::Decompress)?;
    Ok(out)
}
