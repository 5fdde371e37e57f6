//! `CompatCheckpointer`: synthesizes a single-file legacy checkpoint before
//! any destructive work on a v2-format table, per spec.md §4.6. Grounded in
//! `checkpoint::pipeline`'s separation of "inspect, decide, write" phases
//! and in `file_storage::backend::StorageBackend`'s trait-seam-over-one-
//! concrete-implementation shape.
//!
//! Real Arrow/Parquet decoding of checkpoint contents is out of scope (see
//! DESIGN.md): both `.checkpoint.v2.json` and `.checkpoint.v2.parquet`
//! round-trip through the same internal JSON representation here. A v2
//! checkpoint using any other serialization is treated as step 2's "found,
//! return" case only if it happens to already be classic — a genuinely
//! unrecognized encoding otherwise surfaces as a read error, not a silent
//! skip, since it is not safe to assume it matches this representation.

pub mod errors;

use std::path::Path;

pub use errors::{CompatError, CompatResult};

use crate::codec;
use crate::model::{Action, ArtifactKind, CheckpointFormat};
use crate::snapshot::CheckpointProviderInfo;
use crate::store::ObjectStore;

/// Internal representation of a v2 checkpoint's top-level index. Real
/// Parquet/Arrow decoding is out of scope; both JSON- and Parquet-tagged v2
/// checkpoints written by this crate's test fixtures use this shape.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct V2CheckpointIndex {
    #[serde(default)]
    pub sidecars: Vec<String>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// Given a v2 top-level checkpoint path, yields its sidecar references
/// (spec.md §6 "CheckpointReader").
pub trait CheckpointReader {
    fn sidecar_references(&self, top_level_path: &Path) -> CompatResult<Vec<String>>;
}

/// Materializes the actions represented by a v2 checkpoint's top-level index
/// (spec.md §6 "ActionSource").
pub trait ActionSource {
    fn read_actions(&self, top_level_path: &Path) -> CompatResult<Vec<Action>>;
}

/// Writes a classic single-file checkpoint (spec.md §6 "CheckpointWriter").
pub trait CheckpointWriter {
    fn write_classic_single_file(&self, actions: &[Action], path: &Path) -> CompatResult<()>;
}

/// The one concrete implementation of the three collaborator traits above,
/// backed by an [`ObjectStore`]. A real embedding engine with a true
/// Arrow/Parquet stack would swap this out; this core only needs the JSON
/// round-trip described on the v2 checkpoint layout.
pub struct ObjectStoreCheckpointIo<'a> {
    pub store: &'a dyn ObjectStore,
}

impl<'a> ObjectStoreCheckpointIo<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }

    fn read_index(&self, top_level_path: &Path) -> CompatResult<V2CheckpointIndex> {
        let bytes = self.store.read(top_level_path)?;
        serde_json::from_slice(&bytes).map_err(|e| CompatError::MalformedCheckpoint {
            path: top_level_path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

impl<'a> CheckpointReader for ObjectStoreCheckpointIo<'a> {
    fn sidecar_references(&self, top_level_path: &Path) -> CompatResult<Vec<String>> {
        Ok(self.read_index(top_level_path)?.sidecars)
    }
}

impl<'a> ActionSource for ObjectStoreCheckpointIo<'a> {
    fn read_actions(&self, top_level_path: &Path) -> CompatResult<Vec<Action>> {
        Ok(self.read_index(top_level_path)?.actions)
    }
}

impl<'a> CheckpointWriter for ObjectStoreCheckpointIo<'a> {
    fn write_classic_single_file(&self, actions: &[Action], path: &Path) -> CompatResult<()> {
        let bytes = serde_json::to_vec(&actions.to_vec())
            .map_err(|e| CompatError::MalformedCheckpoint { path: path.display().to_string(), reason: e.to_string() })?;
        self.store.write(path, &bytes)?;
        Ok(())
    }
}

/// Outcome of a `CompatCheckpointer::run` call, used for metrics (spec.md
/// §4.6 step 4: "elapsed time, the version written (or -1 if skipped)").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompatOutcome {
    pub version_written: Option<u64>,
}

impl CompatOutcome {
    pub fn skipped() -> Self {
        Self { version_written: None }
    }
}

pub struct CompatCheckpointer;

impl CompatCheckpointer {
    /// Run the compatibility-checkpoint algorithm. The caller is
    /// responsible for the gating described in spec.md §4.6 "Trigger"
    /// (only call this when v2 is enabled, a checkpoint provider exists,
    /// and the run will delete at least one artifact).
    pub fn run(
        store: &dyn ObjectStore,
        log_root: &Path,
        checkpoint_provider: &CheckpointProviderInfo,
    ) -> CompatResult<CompatOutcome> {
        // Step 1: already classic, nothing to do.
        if checkpoint_provider.format.is_classic() {
            return Ok(CompatOutcome::skipped());
        }

        // Step 2: a non-v2 complete checkpoint at or below the current
        // version already satisfies legacy readers.
        if Self::classic_complete_checkpoint_leq(store, log_root, checkpoint_provider.version)? {
            return Ok(CompatOutcome::skipped());
        }

        // Step 3: materialize and write.
        let io = ObjectStoreCheckpointIo::new(store);
        let top_level_path = v2_top_level_path(log_root, checkpoint_provider);
        let actions = io.read_actions(&top_level_path)?;
        let target = codec::compat_classic_checkpoint_path(log_root, checkpoint_provider.version);
        io.write_classic_single_file(&actions, &target)?;

        Ok(CompatOutcome { version_written: Some(checkpoint_provider.version) })
    }

    fn classic_complete_checkpoint_leq(store: &dyn ObjectStore, log_root: &Path, max_version: u64) -> CompatResult<bool> {
        let mut multiparts: std::collections::HashMap<u64, Vec<(u32, u32)>> = std::collections::HashMap::new();

        for meta in store.list(log_root)? {
            let ArtifactKind::Checkpoint { version, format } = codec::classify(&meta.path) else {
                continue;
            };
            if version > max_version || format.is_v2() {
                continue;
            }
            match format {
                CheckpointFormat::ClassicSingleFile => return Ok(true),
                CheckpointFormat::ClassicMultipart { part, num_parts } => {
                    multiparts.entry(version).or_default().push((part, num_parts));
                }
                CheckpointFormat::V2 { .. } => unreachable!("filtered above"),
            }
        }

        for parts in multiparts.values() {
            let num_parts = parts[0].1;
            if parts.iter().all(|(_, n)| *n == num_parts) {
                let mut seen: Vec<u32> = parts.iter().map(|(p, _)| *p).collect();
                seen.sort_unstable();
                seen.dedup();
                if seen.len() as u32 == num_parts {
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }
}

/// The current v2 checkpoint is assumed to live at the classic naming
/// convention's JSON-serialization sibling: `<root>/<v>.checkpoint.v2.json`.
/// Test fixtures that want a `.parquet`-tagged v2 checkpoint still write the
/// same JSON body, per the internal-representation note above.
fn v2_top_level_path(log_root: &Path, checkpoint_provider: &CheckpointProviderInfo) -> std::path::PathBuf {
    match &checkpoint_provider.format {
        CheckpointFormat::V2 { serialization } => {
            let ext = match serialization {
                crate::model::Serialization::Parquet => "parquet",
                _ => "json",
            };
            log_root.join(format!("{:020}.checkpoint.v2.{}", checkpoint_provider.version, ext))
        }
        _ => codec::compat_classic_checkpoint_path(log_root, checkpoint_provider.version),
    }
}
