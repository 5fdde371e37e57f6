//! The only error type `CleanupDriver::cleanup` ever returns, per spec.md
//! §7: everything short of fatal I/O or a programmer error is absorbed into
//! `CleanupStats` and logged instead of propagated.

use thiserror::Error;

pub type CleanupResult<T> = Result<T, CleanupError>;

#[derive(Debug, Error)]
pub enum CleanupError {
    /// Fatal I/O: listing the log directory failed, or the object store is
    /// unreachable. Per spec.md §7 this is the single error kind through
    /// which such failures are surfaced.
    #[error("object store unavailable: {0}")]
    StorageUnavailable(String),

    /// Programmer error, e.g. a path reaching `FileNameCodec::version_of`
    /// that was never classified as versioned. Never expected at runtime
    /// (spec.md §7 "Programmer error").
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<crate::store::StoreError> for CleanupError {
    fn from(err: crate::store::StoreError) -> Self {
        CleanupError::StorageUnavailable(err.to_string())
    }
}

impl From<crate::lister::ListError> for CleanupError {
    fn from(err: crate::lister::ListError) -> Self {
        match err {
            crate::lister::ListError::Store(e) => CleanupError::StorageUnavailable(e.to_string()),
        }
    }
}

impl From<crate::protection::ProtectionError> for CleanupError {
    fn from(err: crate::protection::ProtectionError) -> Self {
        CleanupError::StorageUnavailable(err.to_string())
    }
}

impl From<crate::compat::CompatError> for CleanupError {
    fn from(err: crate::compat::CompatError) -> Self {
        CleanupError::StorageUnavailable(err.to_string())
    }
}

impl From<crate::sidecar::SidecarError> for CleanupError {
    fn from(err: crate::sidecar::SidecarError) -> Self {
        CleanupError::StorageUnavailable(err.to_string())
    }
}
