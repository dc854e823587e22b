//! Error types for the climatology overlay.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using ClimError.
pub type ClimResult<T> = Result<T, ClimError>;

/// Workspace-level error taxonomy.
///
/// Every variant is recoverable: loaders catch these at the store boundary
/// and leave the affected dataset absent.
#[derive(Debug, Error)]
pub enum ClimError {
    // === Data Errors ===
    #[error("Cannot open {path}: {message}")]
    MissingResource { path: PathBuf, message: String },

    #[error("Malformed data: {0}")]
    MalformedData(String),

    #[error("Archive ended early at line {line}: {message}")]
    TruncatedArchive { line: usize, message: String },

    #[error("Data not available: {0}")]
    NotAvailable(String),

    // === Control Flow ===
    #[error("Operation aborted")]
    Aborted,

    // === Configuration ===
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ClimError {
    /// Create a MissingResource error for a path.
    pub fn missing(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MissingResource {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a MalformedData error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedData(msg.into())
    }

    /// Whether this error means the feature should be shown as unavailable
    /// rather than as a failure of the current operation.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            ClimError::MissingResource { .. }
                | ClimError::MalformedData(_)
                | ClimError::NotAvailable(_)
        )
    }
}

impl From<std::io::Error> for ClimError {
    fn from(err: std::io::Error) -> Self {
        ClimError::MissingResource {
            path: PathBuf::new(),
            message: err.to_string(),
        }
    }
}
