//! Metrics registry.
//!
//! - Counters only (no gauges, no histograms)
//! - Monotonic increase
//! - Reset only on process start
//! - Thread-safe but lock-minimal

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the cleanup core's own operations (spec.md §4.6/§4.8/§9).
///
/// All counters use atomic operations with `Relaxed` ordering: eventual
/// consistency is fine for metrics, and only one cleanup run is ever active
/// per table (spec.md §5).
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    cleanup_runs_started: AtomicU64,
    cleanup_runs_skipped: AtomicU64,
    cleanup_runs_completed: AtomicU64,
    commits_deleted: AtomicU64,
    checkpoints_deleted: AtomicU64,
    checksums_deleted: AtomicU64,
    unbackfilled_commits_deleted: AtomicU64,
    protection_gate_denials: AtomicU64,
    compat_checkpoints_written: AtomicU64,
    sidecars_deleted: AtomicU64,
    sidecars_delete_failures: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_cleanup_runs_started(&self) {
        self.cleanup_runs_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cleanup_runs_skipped(&self) {
        self.cleanup_runs_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cleanup_runs_completed(&self) {
        self.cleanup_runs_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_commits_deleted(&self, n: u64) {
        self.commits_deleted.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_checkpoints_deleted(&self, n: u64) {
        self.checkpoints_deleted.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_checksums_deleted(&self, n: u64) {
        self.checksums_deleted.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_unbackfilled_commits_deleted(&self, n: u64) {
        self.unbackfilled_commits_deleted.fetch_add(n, Ordering::Relaxed);
    }

    pub fn increment_protection_gate_denials(&self) {
        self.protection_gate_denials.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_compat_checkpoints_written(&self) {
        self.compat_checkpoints_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_sidecars_deleted(&self, n: u64) {
        self.sidecars_deleted.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_sidecars_delete_failures(&self, n: u64) {
        self.sidecars_delete_failures.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cleanup_runs_started: self.cleanup_runs_started.load(Ordering::Relaxed),
            cleanup_runs_skipped: self.cleanup_runs_skipped.load(Ordering::Relaxed),
            cleanup_runs_completed: self.cleanup_runs_completed.load(Ordering::Relaxed),
            commits_deleted: self.commits_deleted.load(Ordering::Relaxed),
            checkpoints_deleted: self.checkpoints_deleted.load(Ordering::Relaxed),
            checksums_deleted: self.checksums_deleted.load(Ordering::Relaxed),
            unbackfilled_commits_deleted: self.unbackfilled_commits_deleted.load(Ordering::Relaxed),
            protection_gate_denials: self.protection_gate_denials.load(Ordering::Relaxed),
            compat_checkpoints_written: self.compat_checkpoints_written.load(Ordering::Relaxed),
            sidecars_deleted: self.sidecars_deleted.load(Ordering::Relaxed),
            sidecars_delete_failures: self.sidecars_delete_failures.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub cleanup_runs_started: u64,
    pub cleanup_runs_skipped: u64,
    pub cleanup_runs_completed: u64,
    pub commits_deleted: u64,
    pub checkpoints_deleted: u64,
    pub checksums_deleted: u64,
    pub unbackfilled_commits_deleted: u64,
    pub protection_gate_denials: u64,
    pub compat_checkpoints_written: u64,
    pub sidecars_deleted: u64,
    pub sidecars_delete_failures: u64,
}
