//! Error types for json-file-change.
//!
//! All operations return `Result<T>` which aliases `Result<T, ChangeError>`.

use crate::store::StoreError;
use thiserror::Error;

/// Errors from change, record and transaction operations.
#[derive(Debug, Error)]
pub enum ChangeError {
    /// Record carries a classId that maps to no known change kind.
    #[error("Unknown change discriminator: {0}")]
    UnknownDiscriminator(i64),

    /// Required record field is absent or has the wrong shape.
    #[error("Malformed record: field '{0}' is missing or invalid")]
    MalformedRecord(String),

    /// Path or name rejected before reaching the store.
    #[error("Invalid path '{0}': {1}")]
    InvalidPath(String, String),

    /// Transaction was already committed or reverted.
    #[error("Transaction is closed")]
    Closed,

    /// A change failed to revert; `remaining` changes are still applied.
    #[error("Revert failed with {remaining} change(s) still applied: {source}")]
    RevertFailed {
        remaining: usize,
        #[source]
        source: Box<ChangeError>,
    },

    /// Store rejected an operation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// File system operation failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON parse or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unexpected error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for json-file-change operations.
pub type Result<T> = std::result::Result<T, ChangeError>;
