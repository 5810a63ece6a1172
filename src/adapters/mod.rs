//! Adapters Layer
//!
//! Inbound adapters drive the application (HTTP API); outbound adapters
//! implement the domain ports (MaxMind download, local files, MMDB decoding).

pub mod inbound;
pub mod outbound;
