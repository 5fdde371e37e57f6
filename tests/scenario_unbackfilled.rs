//! End-to-end scenario 6 from spec.md §8: unbackfilled (staged) commits
//! above `maxDeletedCommitVersion` are left untouched by shadow deletion.

mod support;

use logkeep::cleanup::CleanupDriver;
use logkeep::codec;
use logkeep::model::{CheckpointFormat, ClientCapabilities};
use logkeep::observability::MetricsRegistry;
use logkeep::protection::CleanupContext;
use logkeep::snapshot::{CheckpointProviderInfo, StaticSnapshot, TableRetentionConfig};
use logkeep::time::FixedClock;

use support::{TestLog, DAY_MS};

#[test]
fn staging_area_untouched_when_max_deleted_is_below_it() {
    let log = TestLog::new();

    // Commits 0..10 backfilled, plus staged unbackfilled twins at 8, 9, 10.
    for v in 0..=10u64 {
        log.write_commit(v, 0);
    }
    for v in [8u64, 9, 10] {
        log.write_staged_commit(v, 0);
    }
    log.write_classic_checkpoint(6, 0);

    let config = TableRetentionConfig { log_retention_millis: 7 * DAY_MS, ..TableRetentionConfig::default() };
    let snapshot = StaticSnapshot::new(log.root().to_path_buf(), config)
        .with_checkpoint_provider(CheckpointProviderInfo { version: 6, format: CheckpointFormat::ClassicSingleFile });
    let metrics = MetricsRegistry::new();

    let stats = CleanupDriver::cleanup(
        &snapshot,
        &log.store,
        &ClientCapabilities::new(3, 3),
        &CleanupContext::default(),
        &FixedClock(100 * DAY_MS),
        &metrics,
    )
    .unwrap();

    // Backfilled commits 0..5 are deleted (safety threshold caps expiry at
    // the checkpoint version minus one); the staging twins at 8, 9, 10 sit
    // above maxDeletedCommitVersion (5) and are left in place.
    for v in 0..=5u64 {
        assert!(!log.exists(&codec::commit_path(log.root(), v)), "backfilled version {v} should be deleted");
    }
    assert_eq!(stats.commits_deleted, 6);
    for v in [8u64, 9, 10] {
        let staged = log.root().join(format!("_staged_commits/{:020}.json", v));
        assert!(log.exists(&staged), "staged version {v} must survive");
    }
    assert_eq!(stats.unbackfilled_commits_deleted, 0);
}
