//! `SidecarGC`: after checkpoint deletion, removes sidecar part-files no
//! longer referenced by any surviving v2 checkpoint, per spec.md §4.7.
//! Grounded in `backup::manifest`'s "enumerate, union references, GC the
//! rest" shape and in `file_storage::local::LocalBackend::list`'s
//! best-effort-per-file deletion style.
//!
//! Implements the stricter two-phase contract from spec.md §9 Open Question
//! (b): the active set is computed from *all* surviving checkpoints before
//! any sidecar is deleted, rather than as a single lazy pass.

pub mod errors;

use std::collections::HashSet;
use std::path::Path;

pub use errors::{SidecarError, SidecarResult};

use crate::codec;
use crate::compat::{CheckpointReader, ObjectStoreCheckpointIo};
use crate::model::{ArtifactKind, CheckpointFormat, Serialization};
use crate::store::ObjectStore;

/// Outcome of a `SidecarGC::run` call, used for metrics (spec.md §A.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SidecarGcStats {
    pub deleted: u64,
    pub retained: u64,
    pub failed: u64,
    /// Surviving v2 checkpoints whose serialization this core doesn't
    /// recognize; their sidecar references are skipped rather than
    /// guessed at (spec.md §4.7 "split by serialization ... other-warn").
    pub unrecognized_checkpoints: u64,
}

pub struct SidecarGC;

impl SidecarGC {
    /// Run the algorithm in spec.md §4.7. `cutoff_millis` is the same
    /// cutoff used for log expiry, protecting in-progress checkpoints
    /// younger than it.
    pub fn run(store: &dyn ObjectStore, log_root: &Path, cutoff_millis: i64) -> SidecarResult<SidecarGcStats> {
        let mut stats = SidecarGcStats::default();

        // Step 1 + 2: union the active set across every surviving v2
        // checkpoint before touching the sidecar directory.
        let mut active: HashSet<String> = HashSet::new();
        let io = ObjectStoreCheckpointIo::new(store);
        for meta in store.list(log_root)? {
            let ArtifactKind::Checkpoint { format: CheckpointFormat::V2 { serialization }, .. } =
                codec::classify(&meta.path)
            else {
                continue;
            };
            match serialization {
                Serialization::Json | Serialization::Parquet => {
                    active.extend(io.sidecar_references(&meta.path)?);
                }
                Serialization::Other(_) => {
                    stats.unrecognized_checkpoints += 1;
                }
            }
        }

        // Step 3: missing sidecar directory is a no-op, not an error.
        let sidecar_dir = log_root.join(codec::SIDECARS_DIR);
        let entries = store.list(&sidecar_dir)?;

        // Step 4: delete unreferenced, old-enough sidecars, best-effort.
        for meta in entries {
            let Some(bare) = meta.path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let eligible = meta.modification_time_millis < cutoff_millis && !active.contains(bare);
            if !eligible {
                stats.retained += 1;
                continue;
            }
            match store.delete(&meta.path) {
                Ok(true) => stats.deleted += 1,
                Ok(false) => {}
                Err(_) => stats.failed += 1,
            }
        }

        Ok(stats)
    }
}
