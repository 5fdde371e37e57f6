//! Truncation of wall-clock instants to UTC bucket boundaries, per spec.md
//! §4.3. Grounded in `wal::record`'s use of `chrono` for commit timestamps;
//! the teacher depends on `chrono` throughout but has no equivalent
//! truncation helper, so this module is new code following the teacher's
//! dependency choice rather than its shape.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};

/// Source of the current wall-clock instant, per spec.md §6
/// "Clock.nowMillis()". Kept as a trait so tests drive the cutoff
/// deterministically instead of racing real time.
pub trait Clock {
    fn now_millis(&self) -> i64;
}

/// The real system clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A clock fixed to a single instant, used by tests and by the CLI's
/// `--now` override.
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// Bucket width used to coarsen a cutoff so that deletions only advance at
/// bucket boundaries (spec.md §4.3's "grace window").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Day,
    Hour,
    Minute,
}

/// Truncate `epoch_millis` down to the start of the UTC bucket that contains
/// it. DAY truncates to the previous midnight UTC.
pub fn truncate(epoch_millis: i64, granularity: Granularity) -> i64 {
    let dt: DateTime<Utc> = Utc.timestamp_millis_opt(epoch_millis).single().unwrap_or_else(|| {
        // Ambiguous/out-of-range inputs can't occur for UTC, but fall back to
        // the raw instant rather than panicking on malformed input.
        Utc.timestamp_millis_opt(0).unwrap()
    });

    let truncated = match granularity {
        Granularity::Day => Utc
            .with_ymd_and_hms(dt.year(), dt.month(), dt.day(), 0, 0, 0)
            .single()
            .expect("valid UTC calendar date"),
        Granularity::Hour => Utc
            .with_ymd_and_hms(dt.year(), dt.month(), dt.day(), dt.hour(), 0, 0)
            .single()
            .expect("valid UTC calendar date"),
        Granularity::Minute => Utc
            .with_ymd_and_hms(dt.year(), dt.month(), dt.day(), dt.hour(), dt.minute(), 0)
            .single()
            .expect("valid UTC calendar date"),
    };

    truncated.timestamp_millis()
}
