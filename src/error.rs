//! The crate-wide error type.
//!
//! Every stage reports through [`EtlError`]. Variants mirror the failure
//! classes of the pipeline: file access, decoding, record parsing, header
//! lookup, key material, store writes, and store reads. Write and query
//! variants carry the engine name so an operator can tell the two targets
//! apart in logs.

use std::io;
use thiserror::Error;

/// Error type for ingestion, encryption, and store operations.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("cannot decode '{path}' as {encoding}")]
    Decode { path: String, encoding: &'static str },
    #[error("malformed record #{record} in '{path}': {message}")]
    Parse {
        path: String,
        record: u64,
        message: String,
    },
    #[error("column '{0}' not found in header")]
    MissingColumn(String),
    #[error("encryption failure: {0}")]
    Crypto(String),
    #[error("write to {engine} failed: {source}")]
    Write {
        engine: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("query against {engine} failed: {message}")]
    Query { engine: String, message: String },
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl EtlError {
    /// Whether the failure is contained at its step boundary (the run
    /// continues) rather than aborting the pipeline.
    #[must_use]
    pub fn is_contained(&self) -> bool {
        matches!(self, EtlError::Write { .. } | EtlError::Query { .. })
    }
}
