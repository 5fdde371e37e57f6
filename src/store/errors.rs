//! Object store errors, grown from `file_storage::errors::StorageError`.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures an [`super::ObjectStore`] implementation can raise. Per spec.md
/// §7 these are all "Fatal I/O" from the cleanup core's point of view:
/// anything surfaced here propagates as `CleanupError::StorageUnavailable`.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("I/O error at {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("invalid path: {0}")]
    InvalidPath(String),
}
