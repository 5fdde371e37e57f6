//! `CompatCheckpointer` errors.

use thiserror::Error;

pub type CompatResult<T> = Result<T, CompatError>;

#[derive(Debug, Error)]
pub enum CompatError {
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),

    #[error("malformed v2 checkpoint at {path}: {reason}")]
    MalformedCheckpoint { path: String, reason: String },
}
