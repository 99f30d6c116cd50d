//! Error types for loading inputs and driving a run.

use std::path::PathBuf;

use thiserror::Error;

use crate::oracle::OracleError;

/// Failure to load the expectation matrix or the definition library.
///
/// Always fatal: a run never starts probing with a broken input.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        source: serde_yaml::Error,
    },

    #[error("Invalid {origin}: {reason}")]
    Invalid { origin: String, reason: String },
}

/// Fatal failure while a run is in progress.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to list API resources: {0}")]
    Discovery(#[source] OracleError),

    #[error("Failed to create temporary namespace {namespace}: {source}")]
    NamespaceCreation {
        namespace: String,
        source: OracleError,
    },
}

pub(crate) fn read_file(path: &std::path::Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })
}
