//! Error types for clipview

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for clipview operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Deserialization error in field `{field}`: {reason}")]
    Deserialization { field: String, reason: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Viewer-state slot {index} out of range (document has {count} slots)")]
    SlotOutOfRange { index: usize, count: usize },

    #[error("Viewer-state slot {0} is empty")]
    EmptySlot(usize),

    #[error("Snapshot to {} failed: {source}", path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Visualization error: {0}")]
    Visualization(String),
}

impl Error {
    /// Shorthand for a deserialization error on `field`
    pub fn deserialization(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Deserialization {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for clipview operations
pub type Result<T> = std::result::Result<T, Error>;
