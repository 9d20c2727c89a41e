//! Storage Layer
//!
//! Persists the averaged calibration baseline so it survives restarts.

mod store;

pub use store::{BaselineRecord, BaselineStore, FORMAT_VERSION};

use std::path::PathBuf;
use thiserror::Error;

/// Errors while restoring a baseline
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("No baseline stored at {0}")]
    NotFound(PathBuf),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Baseline data is corrupt: {0}")]
    Corrupt(String),
    #[error("Unsupported baseline format version {0}")]
    UnsupportedVersion(u8),
    #[error("Baseline contains non-finite coordinates")]
    Invalid,
}

/// Errors while persisting a baseline
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to encode baseline: {0}")]
    Encode(String),
}
