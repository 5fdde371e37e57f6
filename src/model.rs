//! Shared data model for log artifacts, protocol descriptors, and version
//! ranges.
//!
//! Grown from the record types in `checkpoint::marker` and `wal::record`:
//! small, `serde`-derived structs with no behavior beyond what their own
//! invariants require.

use std::collections::HashSet;
use std::path::PathBuf;

/// How a v2 checkpoint's top-level index is serialized.
///
/// `Json` and `Parquet` both round-trip through this crate's internal JSON
/// representation (full Arrow/Parquet decoding is out of scope, see
/// DESIGN.md); `Other` is the extensibility seam `SidecarGC` warns on and
/// skips per spec §4.7.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Serialization {
    Json,
    Parquet,
    Other(String),
}

/// Checkpoint physical layout, per spec.md §3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointFormat {
    ClassicSingleFile,
    ClassicMultipart { part: u32, num_parts: u32 },
    V2 { serialization: Serialization },
}

impl CheckpointFormat {
    /// Only v2 checkpoints reference sidecars (spec.md §3).
    pub fn is_v2(&self) -> bool {
        matches!(self, CheckpointFormat::V2 { .. })
    }

    pub fn is_classic(&self) -> bool {
        matches!(
            self,
            CheckpointFormat::ClassicSingleFile | CheckpointFormat::ClassicMultipart { .. }
        )
    }
}

/// Classification of a single path under the log root, per spec.md §4.1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKind {
    /// `backfilled = false` means this is the staging-area twin.
    Commit { version: u64, backfilled: bool },
    Checkpoint { version: u64, format: CheckpointFormat },
    Checksum { version: u64 },
    Sidecar,
    Unknown,
}

impl ArtifactKind {
    pub fn version(&self) -> Option<u64> {
        match self {
            ArtifactKind::Commit { version, .. } => Some(*version),
            ArtifactKind::Checkpoint { version, .. } => Some(*version),
            ArtifactKind::Checksum { version } => Some(*version),
            ArtifactKind::Sidecar | ArtifactKind::Unknown => None,
        }
    }

    pub fn is_commit(&self) -> bool {
        matches!(self, ArtifactKind::Commit { .. })
    }

    pub fn is_checkpoint(&self) -> bool {
        matches!(self, ArtifactKind::Checkpoint { .. })
    }

    pub fn is_checksum(&self) -> bool {
        matches!(self, ArtifactKind::Checksum { .. })
    }

    pub fn is_backfilled_commit(&self) -> bool {
        matches!(self, ArtifactKind::Commit { backfilled: true, .. })
    }
}

/// A single entry discovered under the log root: a path plus the metadata
/// needed to decide whether it is safe to delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub path: PathBuf,
    pub kind: ArtifactKind,
    pub modification_time_millis: i64,
    pub size: u64,
}

impl LogEntry {
    pub fn new(path: PathBuf, kind: ArtifactKind, modification_time_millis: i64, size: u64) -> Self {
        Self {
            path,
            kind,
            modification_time_millis,
            size,
        }
    }

    pub fn version(&self) -> Option<u64> {
        self.kind.version()
    }
}

/// Inclusive `[lo, hi]` range over versions. `lo > hi` is the canonical
/// empty range, per spec.md §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
    pub lo: i64,
    pub hi: i64,
}

impl VersionRange {
    pub fn empty() -> Self {
        Self { lo: 0, hi: -1 }
    }

    pub fn new(lo: i64, hi: i64) -> Self {
        Self { lo, hi }
    }

    pub fn is_empty(&self) -> bool {
        self.lo > self.hi
    }

    /// Widen the range to include `v`, or start it at `v` if empty.
    pub fn include(&mut self, v: i64) {
        if self.is_empty() {
            self.lo = v;
            self.hi = v;
        } else {
            self.hi = v;
        }
    }
}

/// `{minReaderVersion, minWriterVersion, readerFeatures[], writerFeatures[]}`
/// per spec.md §3.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProtocolDescriptor {
    pub min_reader_version: u32,
    pub min_writer_version: u32,
    #[serde(default)]
    pub reader_features: Vec<String>,
    #[serde(default)]
    pub writer_features: Vec<String>,
}

impl ProtocolDescriptor {
    pub fn legacy(min_reader_version: u32, min_writer_version: u32) -> Self {
        Self {
            min_reader_version,
            min_writer_version,
            reader_features: Vec::new(),
            writer_features: Vec::new(),
        }
    }

    pub fn supported_for_read(&self, caps: &ClientCapabilities) -> bool {
        caps.max_reader_version >= self.min_reader_version
            && self
                .reader_features
                .iter()
                .all(|f| caps.reader_features.contains(f))
    }

    pub fn supported_for_write(&self, caps: &ClientCapabilities) -> bool {
        caps.max_writer_version >= self.min_writer_version
            && self
                .writer_features
                .iter()
                .all(|f| caps.writer_features.contains(f))
    }
}

/// The local client's declared capability set, used to evaluate
/// `ProtocolDescriptor::supported_for_{read,write}`.
#[derive(Debug, Clone)]
pub struct ClientCapabilities {
    pub max_reader_version: u32,
    pub max_writer_version: u32,
    pub reader_features: HashSet<String>,
    pub writer_features: HashSet<String>,
}

impl ClientCapabilities {
    pub fn new(max_reader_version: u32, max_writer_version: u32) -> Self {
        Self {
            max_reader_version,
            max_writer_version,
            reader_features: HashSet::new(),
            writer_features: HashSet::new(),
        }
    }

    pub fn with_reader_feature(mut self, feature: impl Into<String>) -> Self {
        self.reader_features.insert(feature.into());
        self
    }

    pub fn with_writer_feature(mut self, feature: impl Into<String>) -> Self {
        self.writer_features.insert(feature.into());
        self
    }
}

/// A single opaque log action. Full action-schema modeling is out of scope
/// (spec.md §1 places the commit/checkpoint writer out of scope); this core
/// only needs to carry actions through `CompatCheckpointer` unmodified.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Action(pub serde_json::Value);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_range_empty_sentinel() {
        let r = VersionRange::empty();
        assert!(r.is_empty());
        assert!(r.lo > r.hi);
    }

    #[test]
    fn version_range_include_grows_hi() {
        let mut r = VersionRange::empty();
        r.include(5);
        assert_eq!(r, VersionRange::new(5, 5));
        r.include(7);
        assert_eq!(r, VersionRange::new(5, 7));
    }

    #[test]
    fn protocol_descriptor_read_support() {
        let caps = ClientCapabilities::new(3, 3).with_reader_feature("deletionVectors");
        let supported = ProtocolDescriptor {
            min_reader_version: 3,
            min_writer_version: 3,
            reader_features: vec!["deletionVectors".into()],
            writer_features: vec![],
        };
        assert!(supported.supported_for_read(&caps));

        let unsupported = ProtocolDescriptor {
            min_reader_version: 3,
            min_writer_version: 3,
            reader_features: vec!["vacuumProtocolCheck".into()],
            writer_features: vec![],
        };
        assert!(!unsupported.supported_for_read(&caps));
    }

    #[test]
    fn protocol_descriptor_version_gate() {
        let caps = ClientCapabilities::new(2, 2);
        let descriptor = ProtocolDescriptor::legacy(3, 3);
        assert!(!descriptor.supported_for_read(&caps));
        assert!(!descriptor.supported_for_write(&caps));
    }

    #[test]
    fn checkpoint_format_classification() {
        assert!(CheckpointFormat::ClassicSingleFile.is_classic());
        assert!(!CheckpointFormat::ClassicSingleFile.is_v2());
        let v2 = CheckpointFormat::V2 { serialization: Serialization::Json };
        assert!(v2.is_v2());
        assert!(!v2.is_classic());
    }
}
