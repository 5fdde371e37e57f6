//! Lazy, forward-only enumeration of a log directory in version order, per
//! spec.md §4.2. Grounded in `file_storage::local::LocalBackend::list`'s
//! directory-listing shape, adapted to classify each entry via
//! [`crate::codec`] and to support restart from a starting version.
//!
//! The underlying [`crate::store::ObjectStore::list`] is not itself lazy
//! (§5 is single-threaded/synchronous; this crate's pure layers sit on top
//! of a materialized listing), but `LogLister` still enforces the contract
//! callers rely on: forward-only, version-ordered, missing-directory-is-empty.

pub mod errors;

use std::path::Path;

pub use errors::{ListError, ListResult};

use crate::codec;
use crate::model::LogEntry;
use crate::store::ObjectStore;

/// Enumerates commits, checkpoints, and checksums directly under the log
/// root plus the staged-commits subdirectory, in ascending version order.
pub struct LogLister;

impl LogLister {
    /// List every classified artifact under `log_root` (root-level entries
    /// plus `_staged_commits/`), restarting from `from_version` inclusive.
    /// `_sidecars/` is enumerated separately by `SidecarGC`, not here.
    pub fn list(
        store: &dyn ObjectStore,
        log_root: &Path,
        from_version: u64,
    ) -> ListResult<Vec<LogEntry>> {
        let mut entries = Vec::new();

        for meta in store.list(log_root)? {
            if in_sidecars_dir(log_root, &meta.path) {
                continue;
            }
            let kind = codec::classify(&meta.path);
            let Some(version) = kind.version() else {
                continue;
            };
            if version < from_version {
                continue;
            }
            entries.push(LogEntry::new(
                meta.path,
                kind,
                meta.modification_time_millis,
                meta.size,
            ));
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}

fn in_sidecars_dir(log_root: &Path, path: &Path) -> bool {
    path.strip_prefix(log_root)
        .ok()
        .and_then(|rel| rel.components().next())
        .map(|first| first.as_os_str() == codec::SIDECARS_DIR)
        .unwrap_or(false)
}
