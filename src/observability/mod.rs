//! Observability: structured logging and metrics.
//!
//! - Observability is read-only; it never influences control flow.
//! - Synchronous, no background threads.
//! - Deterministic output.

pub mod logger;
pub mod metrics;

pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
