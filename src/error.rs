//! Error handling types and utilities.

use crate::index::ValidationReport;
use std::path::PathBuf;

/// A specialized Result type for application-level operations.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods throughout the codebase.
pub type Result<T> = anyhow::Result<T>;

/// Error returned when reading, parsing or persisting a search index fails.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The index file could not be read or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The `Search.setIndex(...)` envelope is malformed.
    #[error("malformed search index envelope: {0}")]
    Wrapper(&'static str),
    /// The payload is not a valid search index object.
    #[error("invalid search index JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The index parsed but breaks its structural invariants.
    #[error("search index is inconsistent: {0}")]
    Invalid(ValidationReport),
    /// A cached snapshot could not be encoded or decoded.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] postcard::Error),
}

/// Error returned when loading the configuration file fails.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
