//! `ProtectionGate`: decides whether a proposed deletion range honors the
//! checkpoint-protection invariant, per spec.md §4.5. Grounded in
//! `checkpoint::marker`'s pattern of reading small persisted marker records
//! to make a go/no-go decision before destructive work proceeds.

pub mod errors;

use std::path::Path;

pub use errors::{ProtectionError, ProtectionResult};

use crate::codec;
use crate::model::{ArtifactKind, CheckpointFormat, ClientCapabilities, LogEntry, ProtocolDescriptor, VersionRange};
use crate::store::ObjectStore;

/// The two client-global runtime knobs from spec.md §6 "Runtime knobs",
/// threaded explicitly rather than read from an ambient environment
/// variable so tests can vary them per call (spec.md §9 "Global state").
#[derive(Debug, Clone, Copy)]
pub struct CleanupContext {
    /// If false, rule 6's protocol-support short-circuit is forced to deny.
    pub allow_metadata_cleanup_when_all_protocols_supported: bool,
    /// If true, rule 5's boundary-checkpoint short-circuit is forced to deny.
    pub allow_metadata_cleanup_checkpoint_existence_check_disabled: bool,
}

impl Default for CleanupContext {
    fn default() -> Self {
        Self {
            allow_metadata_cleanup_when_all_protocols_supported: true,
            allow_metadata_cleanup_checkpoint_existence_check_disabled: false,
        }
    }
}

/// Outcome of a gate evaluation, carrying enough context to log a useful
/// "skipped due to protection" message (spec.md §4.5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allowed,
    Denied { reason: String },
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allowed)
    }
}

/// Record carried by a `.crc` checksum artifact: the protocol descriptor
/// that was in force for the commit at the same version.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChecksumRecord {
    pub version: u64,
    #[serde(default)]
    pub protocol: Option<ProtocolDescriptor>,
}

pub struct ProtectionGate;

impl ProtectionGate {
    /// Evaluate the gate for a proposed deletion stream, per spec.md §4.5
    /// rules 1-6.
    pub fn evaluate(
        store: &dyn ObjectStore,
        log_root: &Path,
        protection_version: u64,
        proposed: &[LogEntry],
        caps: &ClientCapabilities,
        context: &CleanupContext,
    ) -> ProtectionResult<GateDecision> {
        let p = protection_version;

        // Rule 1.
        if p == 0 {
            return Ok(GateDecision::Allowed);
        }

        // Rule 2: version range of commits in the proposed stream that fall
        // in [0, P-1]; stop scanning at the first commit version >= P.
        let mut r = VersionRange::empty();
        for entry in proposed {
            if let ArtifactKind::Commit { version, .. } = entry.kind {
                if version >= p {
                    break;
                }
                r.include(version as i64);
            }
        }

        // Rule 3.
        if r.is_empty() {
            return Ok(GateDecision::Allowed);
        }

        // Rule 4: cleaning the entire protected prefix is its own escape
        // clause.
        if r.hi >= p as i64 - 1 {
            return Ok(GateDecision::Allowed);
        }

        let boundary_version = (r.hi + 1) as u64;

        // Rule 5.
        if !context.allow_metadata_cleanup_checkpoint_existence_check_disabled
            && checkpoint_complete_at(store, log_root, boundary_version)?
        {
            return Ok(GateDecision::Allowed);
        }

        // Rule 6.
        if !context.allow_metadata_cleanup_when_all_protocols_supported {
            return Ok(GateDecision::Denied {
                reason: "protocol-support short-circuit disabled by runtime context".to_string(),
            });
        }

        for version in r.lo..=boundary_version as i64 {
            let version = version as u64;
            let record = match read_checksum(store, log_root, version)? {
                ChecksumLookup::Missing => {
                    return Ok(GateDecision::Denied {
                        reason: format!("no checksum record at version {version}"),
                    });
                }
                ChecksumLookup::Malformed => {
                    return Ok(GateDecision::Denied {
                        reason: format!("checksum record at version {version} is malformed"),
                    });
                }
                ChecksumLookup::Present(record) => record,
            };
            let Some(protocol) = record.protocol else {
                return Ok(GateDecision::Denied {
                    reason: format!("checksum at version {version} carries no protocol descriptor"),
                });
            };
            if !protocol.supported_for_read(caps) {
                return Ok(GateDecision::Denied {
                    reason: format!("protocol at version {version} not read-supported"),
                });
            }
            if version == boundary_version && !protocol.supported_for_write(caps) {
                return Ok(GateDecision::Denied {
                    reason: format!("protocol at boundary version {version} not write-supported"),
                });
            }
        }

        Ok(GateDecision::Allowed)
    }
}

/// Outcome of looking up a `.crc` checksum record. A parse failure is its
/// own outcome rather than a propagated error: per spec.md §7, an invariant
/// violation found during the scan is a denial, not an exception.
enum ChecksumLookup {
    Missing,
    Malformed,
    Present(ChecksumRecord),
}

fn read_checksum(store: &dyn ObjectStore, log_root: &Path, version: u64) -> ProtectionResult<ChecksumLookup> {
    let path = codec::checksum_path(log_root, version);
    if !store.exists(&path)? {
        return Ok(ChecksumLookup::Missing);
    }
    let bytes = store.read(&path)?;
    match serde_json::from_slice::<ChecksumRecord>(&bytes) {
        Ok(record) => Ok(ChecksumLookup::Present(record)),
        Err(_) => Ok(ChecksumLookup::Malformed),
    }
}

/// A checkpoint at `version` is complete if a single-file or v2 top-level
/// file exists, or if every part of a multipart classic checkpoint is
/// present.
fn checkpoint_complete_at(store: &dyn ObjectStore, log_root: &Path, version: u64) -> ProtectionResult<bool> {
    let entries = store.list(log_root)?;
    let mut multipart_seen: Vec<(u32, u32)> = Vec::new();

    for meta in entries {
        let kind = codec::classify(&meta.path);
        let ArtifactKind::Checkpoint { version: v, format } = kind else {
            continue;
        };
        if v != version {
            continue;
        }
        match format {
            CheckpointFormat::ClassicSingleFile => return Ok(true),
            CheckpointFormat::V2 { .. } => return Ok(true),
            CheckpointFormat::ClassicMultipart { part, num_parts } => {
                multipart_seen.push((part, num_parts));
            }
        }
    }

    if let Some((_, num_parts)) = multipart_seen.first() {
        let num_parts = *num_parts;
        if multipart_seen.iter().all(|(_, n)| *n == num_parts) {
            let mut parts: Vec<u32> = multipart_seen.iter().map(|(p, _)| *p).collect();
            parts.sort_unstable();
            parts.dedup();
            return Ok(parts.len() as u32 == num_parts);
        }
    }

    Ok(false)
}
