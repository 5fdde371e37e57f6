//! `ProtectionGate` errors.

use thiserror::Error;

pub type ProtectionResult<T> = Result<T, ProtectionError>;

#[derive(Debug, Error)]
pub enum ProtectionError {
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),
}
