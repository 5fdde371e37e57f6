//! `CleanupDriver`: orchestrates every other component behind the single
//! top-level `cleanup(snapshot)` operation, per spec.md §4.8. Grounded in
//! `checkpoint::pipeline`'s "Idle -> Planning -> Executing -> Idle" staging
//! (spec.md §4.9 "CleanupDriver states").

pub mod errors;
pub mod stats;

pub use errors::{CleanupError, CleanupResult};
pub use stats::{CleanupStats, SkipReason};

use crate::codec;
use crate::compat::CompatCheckpointer;
use crate::expiry::ExpiryIterator;
use crate::lister::LogLister;
use crate::model::{ArtifactKind, ClientCapabilities, LogEntry};
use crate::observability::{Logger, MetricsRegistry, Severity};
use crate::protection::{CleanupContext, GateDecision, ProtectionGate};
use crate::sidecar::SidecarGC;
use crate::snapshot::Snapshot;
use crate::store::ObjectStore;
use crate::time::{self, Clock, Granularity};

/// Everything `cleanup()` decides before touching storage destructively,
/// per SPEC_FULL.md §B.1: grown from `checkpoint::pipeline`'s
/// `PipelineState`/`PhaseAResult` split between "compute what would happen"
/// and "do it". `CleanupDriver::cleanup` both computes and executes a plan;
/// the CLI's `--dry-run` mode computes one and stops there.
#[derive(Debug, Clone)]
pub struct CleanupPlan {
    pub cutoff_millis: i64,
    pub proposed_deletions: Vec<LogEntry>,
    pub compat_checkpoint_needed: bool,
    pub skip_reason: Option<SkipReason>,
}

impl CleanupPlan {
    pub fn is_skipped(&self) -> bool {
        self.skip_reason.is_some()
    }
}

pub struct CleanupDriver;

impl CleanupDriver {
    /// Compute a `CleanupPlan` without deleting or writing anything:
    /// spec.md §4.8 steps 1-4, plus the step-5 trigger condition. Used by
    /// both `cleanup()` and the CLI's dry-run mode.
    pub fn plan(
        snapshot: &dyn Snapshot,
        store: &dyn ObjectStore,
        caps: &ClientCapabilities,
        context: &CleanupContext,
        clock: &dyn Clock,
    ) -> CleanupResult<CleanupPlan> {
        let config = snapshot.config();
        let log_root = snapshot.log_root();

        // Step 1.
        if !config.enable_expired_log_cleanup {
            return Ok(CleanupPlan {
                cutoff_millis: 0,
                proposed_deletions: Vec::new(),
                compat_checkpoint_needed: false,
                skip_reason: Some(SkipReason::RetentionDisabled),
            });
        }

        // Step 2.
        let now = clock.now_millis();
        let cutoff = time::truncate(now - config.log_retention_millis, Granularity::Day);

        // Step 3.
        let all_entries = LogLister::list(store, log_root, 0)?;
        let safety_threshold = snapshot
            .checkpoint_provider()
            .map(|p| p.version as i64 - 1)
            .unwrap_or(-1);
        let versioned_for_expiry: Vec<LogEntry> = all_entries
            .iter()
            .filter(|e| matches!(e.kind, ArtifactKind::Commit { backfilled: true, .. })
                || e.kind.is_checkpoint()
                || e.kind.is_checksum())
            .cloned()
            .collect();
        let proposed: Vec<LogEntry> =
            ExpiryIterator::new(versioned_for_expiry.into_iter(), cutoff, safety_threshold).collect();

        if proposed.is_empty() {
            return Ok(CleanupPlan {
                cutoff_millis: cutoff,
                proposed_deletions: Vec::new(),
                compat_checkpoint_needed: false,
                skip_reason: Some(SkipReason::NothingExpired),
            });
        }

        // Step 4.
        let decision = ProtectionGate::evaluate(
            store,
            log_root,
            config.checkpoint_protection_version,
            &proposed,
            caps,
            context,
        )?;
        if let GateDecision::Denied { reason } = decision {
            return Ok(CleanupPlan {
                cutoff_millis: cutoff,
                proposed_deletions: Vec::new(),
                compat_checkpoint_needed: false,
                skip_reason: Some(SkipReason::ProtectionDenied { reason }),
            });
        }

        let compat_checkpoint_needed =
            config.v2_checkpoints_enabled && snapshot.checkpoint_provider().is_some();

        Ok(CleanupPlan {
            cutoff_millis: cutoff,
            proposed_deletions: proposed,
            compat_checkpoint_needed,
            skip_reason: None,
        })
    }

    /// Run one cleanup invocation against `snapshot`, per spec.md §4.8
    /// steps 1-9. Returns `Ok` for every outcome short of fatal I/O or a
    /// programmer error (spec.md §7 "Propagation": cleanup never makes the
    /// table worse, and a skipped run is success, not failure).
    pub fn cleanup(
        snapshot: &dyn Snapshot,
        store: &dyn ObjectStore,
        caps: &ClientCapabilities,
        context: &CleanupContext,
        clock: &dyn Clock,
        metrics: &MetricsRegistry,
    ) -> CleanupResult<CleanupStats> {
        metrics.increment_cleanup_runs_started();
        let log_root = snapshot.log_root();

        let plan = Self::plan(snapshot, store, caps, context, clock)?;
        if let Some(reason) = plan.skip_reason {
            metrics.increment_cleanup_runs_skipped();
            if matches!(reason, SkipReason::ProtectionDenied { .. }) {
                metrics.increment_protection_gate_denials();
                Logger::info("cleanup_skipped", &[("reason", "protection_denied")]);
            } else {
                let reason_str = match reason {
                    SkipReason::RetentionDisabled => "retention_disabled",
                    SkipReason::NothingExpired => "nothing_expired",
                    SkipReason::ProtectionDenied { .. } => unreachable!(),
                };
                Logger::info("cleanup_skipped", &[("reason", reason_str)]);
            }
            return Ok(CleanupStats::skipped(reason));
        }

        let config = snapshot.config();
        let cutoff = plan.cutoff_millis;
        let proposed = plan.proposed_deletions;
        let mut stats = CleanupStats::default();

        // Step 5.
        if plan.compat_checkpoint_needed {
            if let Some(provider) = snapshot.checkpoint_provider() {
                let outcome = CompatCheckpointer::run(store, log_root, provider)?;
                if let Some(version) = outcome.version_written {
                    metrics.increment_compat_checkpoints_written();
                    stats.compat_checkpoint_written = Some(version);
                    Logger::info("compat_checkpoint_written", &[("version", version.to_string().as_str())]);
                }
            }
        }

        // Step 6.
        let mut max_deleted_commit_version: Option<u64> = None;
        for entry in &proposed {
            let deleted = store.delete(&entry.path).unwrap_or(false);
            if !deleted {
                continue;
            }
            match entry.kind {
                ArtifactKind::Commit { version, backfilled: true } => {
                    stats.commits_deleted += 1;
                    max_deleted_commit_version =
                        Some(max_deleted_commit_version.map_or(version, |m| m.max(version)));
                }
                ArtifactKind::Checkpoint { .. } => stats.checkpoints_deleted += 1,
                ArtifactKind::Checksum { .. } => stats.checksums_deleted += 1,
                _ => {}
            }
        }
        metrics.add_commits_deleted(stats.commits_deleted);
        metrics.add_checkpoints_deleted(stats.checkpoints_deleted);
        metrics.add_checksums_deleted(stats.checksums_deleted);

        // Step 7: shadow deletion of unbackfilled commits.
        if let Some(max_version) = max_deleted_commit_version {
            let staged_dir = log_root.join(codec::STAGED_COMMITS_DIR);
            if store.exists(&staged_dir).unwrap_or(false) {
                let all_entries = LogLister::list(store, log_root, 0)?;
                for entry in &all_entries {
                    let ArtifactKind::Commit { version, backfilled: false } = entry.kind else {
                        continue;
                    };
                    if version > max_version {
                        continue;
                    }
                    if store.delete(&entry.path).unwrap_or(false) {
                        stats.unbackfilled_commits_deleted += 1;
                    }
                }
                metrics.add_unbackfilled_commits_deleted(stats.unbackfilled_commits_deleted);
            }
        }

        // Step 8.
        if stats.any_checkpoint_deleted() && config.v2_checkpoints_enabled {
            let sidecar_stats = SidecarGC::run(store, log_root, cutoff)?;
            stats.sidecars_deleted = sidecar_stats.deleted;
            stats.sidecars_failed = sidecar_stats.failed;
            metrics.add_sidecars_deleted(sidecar_stats.deleted);
            metrics.add_sidecars_delete_failures(sidecar_stats.failed);
        }

        // Step 9.
        metrics.increment_cleanup_runs_completed();
        let snapshot_metrics = metrics.snapshot();
        Logger::log(
            Severity::Info,
            "cleanup_completed",
            &[
                ("commits_deleted", stats.commits_deleted.to_string().as_str()),
                ("checkpoints_deleted", stats.checkpoints_deleted.to_string().as_str()),
                ("checksums_deleted", stats.checksums_deleted.to_string().as_str()),
                ("sidecars_deleted", stats.sidecars_deleted.to_string().as_str()),
                ("total_runs_completed", snapshot_metrics.cleanup_runs_completed.to_string().as_str()),
            ],
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Action, CheckpointFormat};
    use crate::snapshot::{CheckpointProviderInfo, StaticSnapshot, TableRetentionConfig};
    use crate::store::LocalObjectStore;
    use crate::time::FixedClock;
    use tempfile::TempDir;

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    fn caps() -> ClientCapabilities {
        ClientCapabilities::new(3, 3)
    }

    #[test]
    fn disabled_retention_skips_immediately() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path().to_path_buf());
        let snapshot = StaticSnapshot::new(temp.path().to_path_buf(), TableRetentionConfig::disabled());
        let metrics = MetricsRegistry::new();

        let stats = CleanupDriver::cleanup(
            &snapshot,
            &store,
            &caps(),
            &CleanupContext::default(),
            &FixedClock(0),
            &metrics,
        )
        .unwrap();

        assert_eq!(stats.skipped, Some(SkipReason::RetentionDisabled));
    }

    #[test]
    fn empty_log_skips_with_nothing_expired() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path().to_path_buf());
        let snapshot = StaticSnapshot::new(temp.path().to_path_buf(), TableRetentionConfig::default());
        let metrics = MetricsRegistry::new();

        let stats = CleanupDriver::cleanup(
            &snapshot,
            &store,
            &caps(),
            &CleanupContext::default(),
            &FixedClock(0),
            &metrics,
        )
        .unwrap();

        assert_eq!(stats.skipped, Some(SkipReason::NothingExpired));
    }

    #[test]
    fn simple_expiry_deletes_old_commits_and_keeps_recent_ones() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path().to_path_buf());
        let root = temp.path();

        // commits 0..=10, checkpoint at 5; 0..=8 are 30 days old, 9..10 are
        // 1 hour old (spec.md §8 scenario 1).
        for v in 0..=10u64 {
            let path = root.join(format!("{:020}.json", v));
            store.write(&path, b"{}").unwrap();
            let age = if v >= 9 { 60 * 60 * 1000 } else { 30 * DAY_MS };
            store.set_modification_time(&path, 30 * DAY_MS - age).unwrap();
        }
        store.write(&root.join("00000000000000000005.checkpoint.parquet"), b"x").unwrap();
        store
            .set_modification_time(&root.join("00000000000000000005.checkpoint.parquet"), 0)
            .unwrap();

        let config = TableRetentionConfig {
            log_retention_millis: 7 * DAY_MS,
            ..TableRetentionConfig::default()
        };
        let snapshot = StaticSnapshot::new(root.to_path_buf(), config).with_checkpoint_provider(
            CheckpointProviderInfo { version: 5, format: CheckpointFormat::ClassicSingleFile },
        );
        let metrics = MetricsRegistry::new();
        let now = 30 * DAY_MS;

        let stats = CleanupDriver::cleanup(
            &snapshot,
            &store,
            &caps(),
            &CleanupContext::default(),
            &FixedClock(now),
            &metrics,
        )
        .unwrap();

        assert!(stats.skipped.is_none());
        assert!(!store.exists(&root.join("00000000000000000000.json")).unwrap());
        assert!(!store.exists(&root.join("00000000000000000004.json")).unwrap());
        assert!(store.exists(&root.join("00000000000000000005.json")).unwrap());
        assert!(store.exists(&root.join("00000000000000000010.json")).unwrap());
    }

    #[test]
    fn protection_gate_without_shortcut_blocks_all_deletion() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path().to_path_buf());
        let root = temp.path();

        for v in 0..=20u64 {
            let path = root.join(format!("{:020}.json", v));
            store.write(&path, b"{}").unwrap();
            store.set_modification_time(&path, 0).unwrap();
        }
        // Checksums present for all versions, but version 12 carries an
        // unsupported writer feature (spec.md §8 scenario 2).
        for v in 0..=20u64 {
            let protocol = if v == 12 {
                crate::model::ProtocolDescriptor {
                    min_reader_version: 1,
                    min_writer_version: 1,
                    reader_features: vec!["neverSupported".to_string()],
                    writer_features: vec![],
                }
            } else {
                crate::model::ProtocolDescriptor::legacy(1, 1)
            };
            let record = crate::protection::ChecksumRecord { version: v, protocol: Some(protocol) };
            let checksum_path = codec::checksum_path(root, v);
            store.write(&checksum_path, serde_json::to_vec(&record).unwrap().as_slice()).unwrap();
            store.set_modification_time(&checksum_path, 0).unwrap();
        }

        let config = TableRetentionConfig {
            checkpoint_protection_version: 15,
            log_retention_millis: 7 * DAY_MS,
            ..TableRetentionConfig::default()
        };
        // The checkpoint provider sits below the protection boundary (14 <
        // 15) so the proposed range [0, 13] does not cover the entire
        // protected prefix (rule 4 does not escape), and no checkpoint file
        // actually exists at the boundary version 14, so rule 5's shortcut
        // does not apply either (spec.md §8 scenario 2).
        let snapshot = StaticSnapshot::new(root.to_path_buf(), config).with_checkpoint_provider(
            CheckpointProviderInfo { version: 14, format: CheckpointFormat::ClassicSingleFile },
        );
        let metrics = MetricsRegistry::new();

        let stats = CleanupDriver::cleanup(
            &snapshot,
            &store,
            &caps(),
            &CleanupContext::default(),
            &FixedClock(100 * DAY_MS),
            &metrics,
        )
        .unwrap();

        assert!(matches!(stats.skipped, Some(SkipReason::ProtectionDenied { .. })));
        assert!(store.exists(&root.join("00000000000000000000.json")).unwrap());
    }

    #[test]
    fn unbackfilled_commits_are_shadow_deleted() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path().to_path_buf());
        let root = temp.path();

        for v in 0..=10u64 {
            let path = root.join(format!("{:020}.json", v));
            store.write(&path, b"{}").unwrap();
            store.set_modification_time(&path, 0).unwrap();
        }
        for v in [8u64, 9, 10] {
            let path = root.join(format!("_staged_commits/{:020}.json", v));
            store.write(&path, b"{}").unwrap();
            store.set_modification_time(&path, 0).unwrap();
        }
        store.write(&root.join("00000000000000000006.checkpoint.parquet"), b"x").unwrap();
        store.set_modification_time(&root.join("00000000000000000006.checkpoint.parquet"), 0).unwrap();

        let config = TableRetentionConfig { log_retention_millis: 7 * DAY_MS, ..TableRetentionConfig::default() };
        let snapshot = StaticSnapshot::new(root.to_path_buf(), config).with_checkpoint_provider(
            CheckpointProviderInfo { version: 6, format: CheckpointFormat::ClassicSingleFile },
        );
        let metrics = MetricsRegistry::new();

        let stats = CleanupDriver::cleanup(
            &snapshot,
            &store,
            &caps(),
            &CleanupContext::default(),
            &FixedClock(100 * DAY_MS),
            &metrics,
        )
        .unwrap();

        assert!(stats.commits_deleted >= 1);
        assert!(store.exists(&root.join("_staged_commits/00000000000000000008.json")).unwrap());
        assert!(store.exists(&root.join("_staged_commits/00000000000000000009.json")).unwrap());
        assert!(store.exists(&root.join("_staged_commits/00000000000000000010.json")).unwrap());
    }

    #[test]
    fn v2_compat_writes_classic_checkpoint_before_deleting() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path().to_path_buf());
        let root = temp.path();

        // Versions 0..19 are old enough to expire (their deletion is gated
        // by the *next* version's age); versions 20..25, including the
        // checkpoint at 20, are young and act as the witness that halts
        // expiry at 19 (spec.md §4.4's next-commit-witness rule).
        for v in 0..=25u64 {
            let path = root.join(format!("{:020}.json", v));
            store.write(&path, b"{}").unwrap();
            let mod_time = if v < 20 { 0 } else { 30 * DAY_MS };
            store.set_modification_time(&path, mod_time).unwrap();
        }
        let index = crate::compat::V2CheckpointIndex {
            sidecars: vec![],
            actions: vec![Action(serde_json::json!({"add": "p"}))],
        };
        let top_level = root.join("00000000000000000020.checkpoint.v2.json");
        store.write(&top_level, serde_json::to_vec(&index).unwrap().as_slice()).unwrap();
        store.set_modification_time(&top_level, 30 * DAY_MS).unwrap();

        let config = TableRetentionConfig {
            log_retention_millis: 7 * DAY_MS,
            v2_checkpoints_enabled: true,
            ..TableRetentionConfig::default()
        };
        let snapshot = StaticSnapshot::new(root.to_path_buf(), config).with_checkpoint_provider(
            CheckpointProviderInfo {
                version: 20,
                format: CheckpointFormat::V2 { serialization: crate::model::Serialization::Json },
            },
        );
        let metrics = MetricsRegistry::new();

        let stats = CleanupDriver::cleanup(
            &snapshot,
            &store,
            &caps(),
            &CleanupContext::default(),
            &FixedClock(30 * DAY_MS),
            &metrics,
        )
        .unwrap();

        assert_eq!(stats.compat_checkpoint_written, Some(20));
        assert!(store.exists(&codec::compat_classic_checkpoint_path(root, 20)).unwrap());
        assert!(!store.exists(&root.join("00000000000000000000.json")).unwrap());
        assert!(!store.exists(&root.join("00000000000000000018.json")).unwrap());
        assert!(store.exists(&root.join("00000000000000000019.json")).unwrap());
        assert!(store.exists(&root.join("00000000000000000020.json")).unwrap());
        assert!(store.exists(&top_level).unwrap());
    }
}
