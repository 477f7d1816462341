//! Per-target metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a single configured target
#[derive(Debug, Default)]
pub struct TargetMetrics {
    /// Sends issued
    attempted: AtomicU64,
    /// Sends that completed successfully
    delivered: AtomicU64,
    /// Sends that failed
    failed: AtomicU64,
    /// Events that could not be encoded for this target; never sent
    encode_failed: AtomicU64,
    /// Datagrams skipped while the host was unresolved
    skipped: AtomicU64,
}

impl TargetMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_attempted(&self) {
        self.attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_encode_failed(&self) {
        self.encode_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            attempted: self.attempted.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            encode_failed: self.encode_failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of target metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub attempted: u64,
    pub delivered: u64,
    pub failed: u64,
    pub encode_failed: u64,
    pub skipped: u64,
}

impl MetricsSnapshot {
    /// Sends still in flight when the snapshot was taken.
    pub fn in_flight(&self) -> u64 {
        self.attempted
            .saturating_sub(self.delivered)
            .saturating_sub(self.failed)
    }
}
