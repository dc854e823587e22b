//! Error types for grid decoding.

use std::path::PathBuf;

use clim_common::ClimError;
use thiserror::Error;

/// Result type for grid store operations.
pub type GridResult<T> = Result<T, GridStoreError>;

/// Error types for grid decoding.
#[derive(Error, Debug)]
pub enum GridStoreError {
    /// File could not be opened or read
    #[error("failed to read {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stream ended inside a record
    #[error("grid data truncated: needed {needed} more bytes for {context}")]
    Truncated { needed: usize, context: String },

    /// Declared dimensions or variables disagree with the expected layout
    #[error("unexpected grid shape: {0}")]
    Shape(String),

    /// Gzip stream could not be inflated
    #[error("decompression error: {0}")]
    Decompression(String),

    /// Container library reported an error
    #[error("invalid container: {0}")]
    Container(String),
}

impl GridStoreError {
    pub fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }
}

impl From<GridStoreError> for ClimError {
    fn from(err: GridStoreError) -> Self {
        match err {
            GridStoreError::Open { path, source } => ClimError::missing(path, source.to_string()),
            other => ClimError::MalformedData(other.to_string()),
        }
    }
}
