//! Error types for archive parsing.

use std::path::PathBuf;

use clim_common::ClimError;
use thiserror::Error;

/// Result type for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Error types for archive parsing.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// File could not be opened or read
    #[error("failed to read {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Archive ended inside a record, or a line is too short for its fields
    #[error("archive truncated at line {line}: {reason}")]
    Truncated { line: usize, reason: String },

    /// A field could not be interpreted
    #[error("malformed record at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

impl ArchiveError {
    pub fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    pub fn truncated(line: usize, reason: impl Into<String>) -> Self {
        Self::Truncated {
            line,
            reason: reason.into(),
        }
    }

    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            reason: reason.into(),
        }
    }
}

impl From<ArchiveError> for ClimError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::Open { path, source } => ClimError::missing(path, source.to_string()),
            ArchiveError::Truncated { line, reason } => ClimError::TruncatedArchive {
                line,
                message: reason,
            },
            malformed @ ArchiveError::Malformed { .. } => ClimError::MalformedData(malformed.to_string()),
        }
    }
}
