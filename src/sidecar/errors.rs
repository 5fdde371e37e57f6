//! `SidecarGC` errors.

use thiserror::Error;

pub type SidecarResult<T> = Result<T, SidecarError>;

#[derive(Debug, Error)]
pub enum SidecarError {
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),

    #[error(transparent)]
    Compat(#[from] crate::compat::CompatError),
}
