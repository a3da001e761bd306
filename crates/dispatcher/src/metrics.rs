//! Dispatch metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every worker of a dispatcher
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Dispatch cycles that drained at least one event
    batch_count: AtomicU64,
    /// Events in batches the site accepted
    events_sent: AtomicU64,
    /// Batches lost to transport or serialization errors
    failure_count: AtomicU64,
    /// Events in failed batches
    events_dropped: AtomicU64,
    /// Hook invocations that returned an error
    hook_failures: AtomicU64,
    /// Workers that exited on the capability probe
    unsupported_exits: AtomicU64,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch_count(&self) -> u64 {
        self.batch_count.load(Ordering::Relaxed)
    }

    pub fn events_sent(&self) -> u64 {
        self.events_sent.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn events_dropped(&self) -> u64 {
        self.events_dropped.load(Ordering::Relaxed)
    }

    pub fn hook_failures(&self) -> u64 {
        self.hook_failures.load(Ordering::Relaxed)
    }

    pub fn unsupported_exits(&self) -> u64 {
        self.unsupported_exits.load(Ordering::Relaxed)
    }

    /// Record a batch the site accepted
    pub fn record_sent(&self, events: usize) {
        self.batch_count.fetch_add(1, Ordering::Relaxed);
        self.events_sent.fetch_add(events as u64, Ordering::Relaxed);
    }

    /// Record a batch lost to a send failure
    pub fn record_failed(&self, events: usize) {
        self.batch_count.fetch_add(1, Ordering::Relaxed);
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        self.events_dropped.fetch_add(events as u64, Ordering::Relaxed);
    }

    pub fn inc_hook_failures(&self) {
        self.hook_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_unsupported_exits(&self) {
        self.unsupported_exits.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batch_count: self.batch_count(),
            events_sent: self.events_sent(),
            failure_count: self.failure_count(),
            events_dropped: self.events_dropped(),
            hook_failures: self.hook_failures(),
            unsupported_exits: self.unsupported_exits(),
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batch_count: u64,
    pub events_sent: u64,
    pub failure_count: u64,
    pub events_dropped: u64,
    pub hook_failures: u64,
    pub unsupported_exits: u64,
}
