//! Table snapshot handle and configuration, per spec.md §3 "Snapshot
//! (input)" and §6 "Configuration". Grounded in
//! `replication::config::ReplicationConfig`/`dx::config::DxConfig`: a small
//! `serde`-derived, `Default`-implementing config struct, here paired with a
//! read-only `Snapshot` trait standing in for the surrounding table engine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::CheckpointFormat;

/// Per-table retention configuration, read from the snapshot's table
/// properties (spec.md §6 "Configuration (per table...)").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRetentionConfig {
    #[serde(default = "default_true")]
    pub enable_expired_log_cleanup: bool,
    #[serde(default = "default_retention_millis")]
    pub log_retention_millis: i64,
    #[serde(default)]
    pub checkpoint_protection_version: u64,
    #[serde(default)]
    pub v2_checkpoints_enabled: bool,
}

fn default_true() -> bool {
    true
}

/// 7 days, matching the grace-window example in spec.md §8 scenario 1.
fn default_retention_millis() -> i64 {
    7 * 24 * 60 * 60 * 1000
}

impl Default for TableRetentionConfig {
    fn default() -> Self {
        Self {
            enable_expired_log_cleanup: default_true(),
            log_retention_millis: default_retention_millis(),
            checkpoint_protection_version: 0,
            v2_checkpoints_enabled: false,
        }
    }
}

impl TableRetentionConfig {
    pub fn disabled() -> Self {
        Self {
            enable_expired_log_cleanup: false,
            ..Self::default()
        }
    }

    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

/// Describes the table's current complete checkpoint, if any, per spec.md
/// §3 "the current checkpoint provider".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointProviderInfo {
    pub version: u64,
    pub format: CheckpointFormat,
}

/// Read-only handle a caller provides to `CleanupDriver`. Per spec.md §9
/// "Long-lived handles", a `Snapshot` must outlive the run but is never
/// mutated by this core.
pub trait Snapshot {
    fn log_root(&self) -> &Path;
    fn config(&self) -> &TableRetentionConfig;
    fn checkpoint_provider(&self) -> Option<&CheckpointProviderInfo>;
}

/// A simple in-memory `Snapshot`, grounded in the teacher's preference for
/// small plain-data structs over builder machinery. Used by the CLI and by
/// tests; a real embedding engine would implement `Snapshot` directly over
/// its own table-state structures.
#[derive(Debug, Clone)]
pub struct StaticSnapshot {
    log_root: PathBuf,
    config: TableRetentionConfig,
    checkpoint_provider: Option<CheckpointProviderInfo>,
}

impl StaticSnapshot {
    pub fn new(log_root: PathBuf, config: TableRetentionConfig) -> Self {
        Self {
            log_root,
            config,
            checkpoint_provider: None,
        }
    }

    pub fn with_checkpoint_provider(mut self, provider: CheckpointProviderInfo) -> Self {
        self.checkpoint_provider = Some(provider);
        self
    }
}

impl Snapshot for StaticSnapshot {
    fn log_root(&self) -> &Path {
        &self.log_root
    }

    fn config(&self) -> &TableRetentionConfig {
        &self.config
    }

    fn checkpoint_provider(&self) -> Option<&CheckpointProviderInfo> {
        self.checkpoint_provider.as_ref()
    }
}
