//! Error types for scanning, configuration and snapshot sources.

use std::path::PathBuf;

use thiserror::Error;

use crate::report::EntityRef;

/// Errors that abort a diagnostic scan.
///
/// A scan either produces a complete report or one of these; partial reports
/// are never returned.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A snapshot violated the input contract (empty identifier, non-finite
    /// rate, ratio out of range).
    #[error("invalid snapshot for {entity}: {reason}")]
    InvalidSnapshot { entity: EntityRef, reason: String },

    /// Two sibling entities of the same kind share an identifier.
    #[error("duplicate entity {entity}")]
    DuplicateEntity { entity: EntityRef },

    /// The deadline passed or the caller cancelled the scan.
    #[error("scan cancelled after {evaluated} of {total} entities")]
    Cancelled { evaluated: usize, total: usize },
}

/// Errors raised while loading or validating probe configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration sources could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is outside its permitted range.
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors raised while reading a snapshot file.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The snapshot was written with an incompatible schema major version.
    #[error("unsupported snapshot schema {major}.{minor}")]
    IncompatibleSchema { major: u32, minor: u32 },
}
