//! `LogLister` errors.

use thiserror::Error;

pub type ListResult<T> = Result<T, ListError>;

#[derive(Debug, Error)]
pub enum ListError {
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),
}
