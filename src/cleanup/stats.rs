//! `CleanupStats`: the return value of `cleanup()`, grounded in
//! `observability::metrics::MetricsSnapshot`'s plain-data snapshot shape
//! (SPEC_FULL.md §B.2).

/// Why a run ended without deleting anything, for the informational log
/// line spec.md §4.5/§4.8 call for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    RetentionDisabled,
    NothingExpired,
    ProtectionDenied { reason: String },
}

/// Outcome of one `cleanup()` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CleanupStats {
    pub commits_deleted: u64,
    pub checkpoints_deleted: u64,
    pub checksums_deleted: u64,
    pub unbackfilled_commits_deleted: u64,
    pub sidecars_deleted: u64,
    pub sidecars_failed: u64,
    pub compat_checkpoint_written: Option<u64>,
    pub skipped: Option<SkipReason>,
}

impl CleanupStats {
    pub fn skipped(reason: SkipReason) -> Self {
        Self {
            skipped: Some(reason),
            ..Self::default()
        }
    }

    pub fn total_deleted(&self) -> u64 {
        self.commits_deleted + self.checkpoints_deleted + self.checksums_deleted + self.unbackfilled_commits_deleted
    }

    pub fn any_checkpoint_deleted(&self) -> bool {
        self.checkpoints_deleted > 0
    }
}
