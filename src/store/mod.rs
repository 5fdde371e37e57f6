//! Object store abstraction.
//!
//! Grown from `file_storage::backend::StorageBackend`/`file_storage::local`:
//! a narrow trait plus one concrete local-filesystem implementation. The
//! surrounding system's full object-store driver is out of scope; this crate
//! only consumes the handful of operations spec.md §6 names.

pub mod errors;
pub mod local;

use std::path::{Path, PathBuf};

pub use errors::{StoreError, StoreResult};
pub use local::LocalObjectStore;

/// Metadata about one listed object, per spec.md §4.2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    pub path: PathBuf,
    pub modification_time_millis: i64,
    pub size: u64,
}

/// The narrow object-store surface this core consumes (spec.md §6).
///
/// `list` returns a materialized `Vec` rather than a true async stream:
/// this crate is single-threaded and synchronous (§5), and `LogLister`
/// restores the lazy, buffered contract on top of this at the `ExpiryIterator`
/// layer.
pub trait ObjectStore: Send + Sync {
    /// List objects whose path starts with `prefix`, sorted by path.
    /// A missing directory is an empty list, never an error.
    fn list(&self, prefix: &Path) -> StoreResult<Vec<ObjectMeta>>;

    /// Delete the object at `path`. Returns `false` if nothing was deleted
    /// (already absent) rather than erroring, matching spec.md §6's
    /// "delete(path) -> bool".
    fn delete(&self, path: &Path) -> StoreResult<bool>;

    /// Check whether an object exists at `path`.
    fn exists(&self, path: &Path) -> StoreResult<bool>;

    /// Write `bytes` to `path`, creating parent directories as needed.
    fn write(&self, path: &Path, bytes: &[u8]) -> StoreResult<()>;

    /// Read the full contents at `path`.
    fn read(&self, path: &Path) -> StoreResult<Vec<u8>>;

    /// Force an object's modification time. Per spec.md §6 this exists for
    /// scenario tests to simulate artifact age without sleeping; production
    /// callers have no reason to invoke it.
    fn set_modification_time(&self, path: &Path, millis: i64) -> StoreResult<()>;
}
