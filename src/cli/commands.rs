//! CLI command implementations.

use std::path::Path;

use serde_json::{json, Value};

use crate::cleanup::{CleanupDriver, CleanupPlan, CleanupStats, SkipReason};
use crate::codec;
use crate::model::{ArtifactKind, CheckpointFormat, ClientCapabilities};
use crate::protection::CleanupContext;
use crate::snapshot::{CheckpointProviderInfo, StaticSnapshot, TableRetentionConfig};
use crate::store::{LocalObjectStore, ObjectStore};
use crate::time::{Clock, FixedClock, SystemClock};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::write_response;

/// Name of the per-table retention config file at the log root. Real table
/// metadata lives in the commit log itself; this CLI is a thin wrapper, so
/// it reads a small sidecar JSON file instead of replaying commits.
const RETENTION_CONFIG_FILE: &str = "_retention_config.json";

/// Dispatch a parsed [`Command`].
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Vacuum { table, dry_run, now } => vacuum(&table, dry_run, now),
    }
}

fn vacuum(table: &Path, dry_run: bool, now: Option<i64>) -> CliResult<()> {
    if !table.is_dir() {
        return Err(CliError::table_error(format!(
            "table log root does not exist: {}",
            table.display()
        )));
    }

    let store = LocalObjectStore::new(table.to_path_buf());
    let config = load_config(&store, table)?;
    let checkpoint_provider = discover_checkpoint_provider(&store, table)
        .map_err(|e| CliError::table_error(e.to_string()))?;

    let mut snapshot = StaticSnapshot::new(table.to_path_buf(), config);
    if let Some(provider) = checkpoint_provider {
        snapshot = snapshot.with_checkpoint_provider(provider);
    }

    // A real embedding engine would supply the caller's negotiated reader/
    // writer feature set; this CLI stands in for one client at protocol
    // version 3 with no optional features, matching this crate's own test
    // fixtures.
    let caps = ClientCapabilities::new(3, 3);
    let context = CleanupContext::default();
    let clock: Box<dyn Clock> = match now {
        Some(millis) => Box::new(FixedClock(millis)),
        None => Box::new(SystemClock),
    };

    if dry_run {
        let plan = CleanupDriver::plan(&snapshot, &store, &caps, &context, clock.as_ref())?;
        write_response(plan_to_json(&plan))?;
        return Ok(());
    }

    let metrics = crate::observability::MetricsRegistry::new();
    let stats = CleanupDriver::cleanup(&snapshot, &store, &caps, &context, clock.as_ref(), &metrics)?;
    write_response(stats_to_json(&stats))?;
    Ok(())
}

fn load_config(store: &dyn ObjectStore, table: &Path) -> CliResult<TableRetentionConfig> {
    let path = table.join(RETENTION_CONFIG_FILE);
    if !store.exists(&path).map_err(|e| CliError::config_error(e.to_string()))? {
        return Ok(TableRetentionConfig::default());
    }
    let bytes = store.read(&path).map_err(|e| CliError::config_error(e.to_string()))?;
    TableRetentionConfig::from_json(&bytes).map_err(|e| CliError::config_error(e.to_string()))
}

/// Find the highest-versioned complete checkpoint under `log_root`. Mirrors
/// `ProtectionGate`'s completeness check for multipart checkpoints, kept as
/// its own small copy here rather than exported from `protection` since the
/// two callers have different surrounding control flow.
fn discover_checkpoint_provider(
    store: &dyn ObjectStore,
    log_root: &Path,
) -> Result<Option<CheckpointProviderInfo>, crate::store::StoreError> {
    use std::collections::HashMap;

    let mut best: Option<(u64, CheckpointFormat)> = None;
    let mut multiparts: HashMap<u64, Vec<(u32, u32)>> = HashMap::new();

    for meta in store.list(log_root)? {
        let ArtifactKind::Checkpoint { version, format } = codec::classify(&meta.path) else {
            continue;
        };
        match &format {
            CheckpointFormat::ClassicSingleFile | CheckpointFormat::V2 { .. } => {
                if best.as_ref().map_or(true, |(v, _)| version > *v) {
                    best = Some((version, format));
                }
            }
            CheckpointFormat::ClassicMultipart { part, num_parts } => {
                multiparts.entry(version).or_default().push((*part, *num_parts));
            }
        }
    }

    for (version, parts) in multiparts {
        let num_parts = parts[0].1;
        if !parts.iter().all(|(_, n)| *n == num_parts) {
            continue;
        }
        let mut seen: Vec<u32> = parts.iter().map(|(p, _)| *p).collect();
        seen.sort_unstable();
        seen.dedup();
        if seen.len() as u32 != num_parts {
            continue;
        }
        if best.as_ref().map_or(true, |(v, _)| version > *v) {
            best = Some((version, CheckpointFormat::ClassicMultipart { part: 1, num_parts }));
        }
    }

    Ok(best.map(|(version, format)| CheckpointProviderInfo { version, format }))
}

fn plan_to_json(plan: &CleanupPlan) -> Value {
    json!({
        "dryRun": true,
        "cutoffMillis": plan.cutoff_millis,
        "proposedDeletions": plan.proposed_deletions.iter().map(|e| e.path.display().to_string()).collect::<Vec<_>>(),
        "compatCheckpointNeeded": plan.compat_checkpoint_needed,
        "skipped": plan.skip_reason.as_ref().map(skip_reason_to_json),
    })
}

fn stats_to_json(stats: &CleanupStats) -> Value {
    json!({
        "commitsDeleted": stats.commits_deleted,
        "checkpointsDeleted": stats.checkpoints_deleted,
        "checksumsDeleted": stats.checksums_deleted,
        "unbackfilledCommitsDeleted": stats.unbackfilled_commits_deleted,
        "sidecarsDeleted": stats.sidecars_deleted,
        "sidecarsFailed": stats.sidecars_failed,
        "compatCheckpointWritten": stats.compat_checkpoint_written,
        "skipped": stats.skipped.as_ref().map(skip_reason_to_json),
    })
}

fn skip_reason_to_json(reason: &SkipReason) -> Value {
    match reason {
        SkipReason::RetentionDisabled => json!({"reason": "retention_disabled"}),
        SkipReason::NothingExpired => json!({"reason": "nothing_expired"}),
        SkipReason::ProtectionDenied { reason } => json!({"reason": "protection_denied", "detail": reason}),
    }
}
