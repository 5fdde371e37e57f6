//! Log artifact filename codec.
//!
//! Pure functions over path strings: classify a path into an
//! [`ArtifactKind`], recover the version it belongs to, and build the one
//! path this core ever writes (the compatibility checkpoint). No I/O.
//!
//! Naming scheme (versions are 20-digit zero-padded decimal):
//!
//! | kind                     | path                                              |
//! |--------------------------|----------------------------------------------------|
//! | backfilled commit        | `<root>/<v>.json`                                   |
//! | unbackfilled commit      | `<root>/_staged_commits/<v>.json`                   |
//! | classic single checkpoint| `<root>/<v>.checkpoint.parquet`                     |
//! | classic multipart        | `<root>/<v>.checkpoint.<part>.<numParts>.parquet`   |
//! | v2 top-level checkpoint  | `<root>/<v>.checkpoint.v2.{json,parquet}`           |
//! | checksum                 | `<root>/<v>.crc`                                    |
//! | sidecar                  | `<root>/_sidecars/<anything>`                       |
//!
//! `classify` never fails: unrecognized names come back as `Unknown`.

use std::path::Path;

use crate::model::{ArtifactKind, CheckpointFormat, Serialization};

/// Subdirectory holding unbackfilled (staged) commits.
pub const STAGED_COMMITS_DIR: &str = "_staged_commits";
/// Subdirectory holding v2 checkpoint sidecar part-files.
pub const SIDECARS_DIR: &str = "_sidecars";

const VERSION_WIDTH: usize = 20;

/// Classify a single path (already known to live somewhere under a log
/// root) into its [`ArtifactKind`].
pub fn classify(path: &Path) -> ArtifactKind {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return ArtifactKind::Unknown;
    };

    if in_dir_named(path, SIDECARS_DIR) {
        return ArtifactKind::Sidecar;
    }

    let backfilled = !in_dir_named(path, STAGED_COMMITS_DIR);

    if let Some(version) = parse_commit_name(file_name) {
        return ArtifactKind::Commit { version, backfilled };
    }

    // Everything past this point only makes sense at the log root, but we
    // don't require that here; callers are responsible for only classifying
    // paths they actually listed under the log root.
    if let Some(version) = parse_checksum_name(file_name) {
        return ArtifactKind::Checksum { version };
    }

    if let Some((version, format)) = parse_checkpoint_name(file_name) {
        return ArtifactKind::Checkpoint { version, format };
    }

    ArtifactKind::Unknown
}

fn in_dir_named(path: &Path, dir_name: &str) -> bool {
    path.parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        == Some(dir_name)
}

fn parse_version_prefix(name: &str) -> Option<(u64, &str)> {
    if name.len() < VERSION_WIDTH {
        return None;
    }
    let (digits, rest) = name.split_at(VERSION_WIDTH);
    if digits.len() != VERSION_WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let version: u64 = digits.parse().ok()?;
    Some((version, rest))
}

fn parse_commit_name(name: &str) -> Option<u64> {
    let (version, rest) = parse_version_prefix(name)?;
    if rest == ".json" {
        Some(version)
    } else {
        None
    }
}

fn parse_checksum_name(name: &str) -> Option<u64> {
    let (version, rest) = parse_version_prefix(name)?;
    if rest == ".crc" {
        Some(version)
    } else {
        None
    }
}

fn parse_checkpoint_name(name: &str) -> Option<(u64, CheckpointFormat)> {
    let (version, rest) = parse_version_prefix(name)?;
    let rest = rest.strip_prefix(".checkpoint")?;

    if rest == ".parquet" {
        return Some((version, CheckpointFormat::ClassicSingleFile));
    }
    if rest == ".v2.json" {
        return Some((
            version,
            CheckpointFormat::V2 { serialization: Serialization::Json },
        ));
    }
    if rest == ".v2.parquet" {
        return Some((
            version,
            CheckpointFormat::V2 { serialization: Serialization::Parquet },
        ));
    }
    if let Some(stripped) = rest.strip_prefix('.').and_then(|r| r.strip_suffix(".parquet")) {
        let mut parts = stripped.split('.');
        let part = parts.next()?.parse::<u32>().ok()?;
        let num_parts = parts.next()?.parse::<u32>().ok()?;
        if parts.next().is_some() {
            return None;
        }
        return Some((
            version,
            CheckpointFormat::ClassicMultipart { part, num_parts },
        ));
    }
    if let Some(ext) = rest.strip_prefix(".v2.") {
        return Some((
            version,
            CheckpointFormat::V2 { serialization: Serialization::Other(ext.to_string()) },
        ));
    }

    None
}

/// Error raised when a caller asks for the version of a path that was not
/// classified as a versioned kind (Sidecar/Unknown). Per spec.md §7 this is
/// a programmer error, never expected at runtime.
#[derive(Debug, thiserror::Error)]
#[error("path is not a versioned log artifact: {0}")]
pub struct NotVersionedError(pub String);

/// Recover the version a classified path belongs to.
pub fn version_of(path: &Path) -> Result<u64, NotVersionedError> {
    classify(path)
        .version()
        .ok_or_else(|| NotVersionedError(path.display().to_string()))
}

/// The single path this core is ever allowed to write: the compatibility
/// classic checkpoint, per spec.md §6 "Persisted state layout".
pub fn compat_classic_checkpoint_path(root: &Path, version: u64) -> std::path::PathBuf {
    root.join(format!("{:0width$}.checkpoint.parquet", version, width = VERSION_WIDTH))
}

/// Canonical backfilled commit path for a version, used by `ProtectionGate`
/// and tests to probe existence without a full listing.
pub fn commit_path(root: &Path, version: u64) -> std::path::PathBuf {
    root.join(format!("{:0width$}.json", version, width = VERSION_WIDTH))
}

/// Canonical checksum path for a version.
pub fn checksum_path(root: &Path, version: u64) -> std::path::PathBuf {
    root.join(format!("{:0width$}.crc", version, width = VERSION_WIDTH))
}
