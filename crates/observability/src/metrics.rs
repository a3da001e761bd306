//! Relay metrics collection
//!
//! Publishes queue and dispatch counters through the `metrics` facade and
//! aggregates samples in memory for an end-of-run summary.

use std::time::Duration;

use dispatcher::{MetricsSnapshot, QueueStats};
use metrics::{counter, gauge, histogram};

/// Publish queue counters.
///
/// Totals are monotonic, so they are exported as absolute counter values.
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_queue_stats;
///
/// record_queue_stats(&queue.stats());
/// ```
pub fn record_queue_stats(stats: &QueueStats) {
    gauge!("metrics_relay_queue_pending").set(stats.pending as f64);
    gauge!("metrics_relay_seen_identities").set(stats.seen_identities as f64);
    histogram!("metrics_relay_queue_pending_hist").record(stats.pending as f64);

    counter!("metrics_relay_events_enqueued_total").absolute(stats.enqueued);
    counter!("metrics_relay_events_suppressed_total").absolute(stats.suppressed);
    counter!("metrics_relay_events_drained_total").absolute(stats.drained);
}

/// Publish dispatch counters shared by all workers
pub fn record_dispatch_metrics(snapshot: &MetricsSnapshot) {
    counter!("metrics_relay_batches_total").absolute(snapshot.batch_count);
    counter!(
        "metrics_relay_events_dispatched_total",
        "status" => "success"
    )
    .absolute(snapshot.events_sent);
    counter!(
        "metrics_relay_events_dispatched_total",
        "status" => "failure"
    )
    .absolute(snapshot.events_dropped);
    counter!("metrics_relay_batch_failures_total").absolute(snapshot.failure_count);
    counter!("metrics_relay_hook_failures_total").absolute(snapshot.hook_failures);
    counter!("metrics_relay_unsupported_exits_total").absolute(snapshot.unsupported_exits);
}

/// Publish dispatcher liveness
pub fn record_dispatcher_state(dispatching: bool, workers: usize) {
    gauge!("metrics_relay_dispatching").set(if dispatching { 1.0 } else { 0.0 });
    gauge!("metrics_relay_workers").set(workers as f64);
}

/// Relay statistics aggregator
///
/// Samples queue depth over a run and keeps the latest counters.
#[derive(Debug, Clone, Default)]
pub struct RelayStatsAggregator {
    /// Number of samples taken
    pub samples: u64,

    /// Pending queue depth
    pub queue_depth: RunningStats,

    /// Latest queue counters
    pub queue: QueueStats,

    /// Latest dispatch counters
    pub dispatch: MetricsSnapshot,
}

impl RelayStatsAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one sample
    pub fn update(&mut self, queue: QueueStats, dispatch: MetricsSnapshot) {
        self.samples += 1;
        self.queue_depth.push(queue.pending as f64);
        self.queue = queue;
        self.dispatch = dispatch;
    }

    /// Build the summary report
    pub fn summary(&self, elapsed: Duration) -> RelaySummary {
        let attempted = self.dispatch.events_sent + self.dispatch.events_dropped;
        RelaySummary {
            elapsed,
            enqueued: self.queue.enqueued,
            suppressed: self.queue.suppressed,
            pending: self.queue.pending,
            batches: self.dispatch.batch_count,
            events_sent: self.dispatch.events_sent,
            events_dropped: self.dispatch.events_dropped,
            drop_rate: if attempted > 0 {
                self.dispatch.events_dropped as f64 / attempted as f64 * 100.0
            } else {
                0.0
            },
            queue_depth: StatsSummary::from(&self.queue_depth),
        }
    }

    /// Reset all statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// End-of-run summary
#[derive(Debug, Clone, Default)]
pub struct RelaySummary {
    pub elapsed: Duration,
    pub enqueued: u64,
    pub suppressed: u64,
    pub pending: usize,
    pub batches: u64,
    pub events_sent: u64,
    pub events_dropped: u64,
    pub drop_rate: f64,
    pub queue_depth: StatsSummary,
}

impl std::fmt::Display for RelaySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Metrics Relay Summary ===")?;
        writeln!(f, "Elapsed: {:.2}s", self.elapsed.as_secs_f64())?;
        writeln!(
            f,
            "Enqueued: {} (suppressed by log_once: {})",
            self.enqueued, self.suppressed
        )?;
        writeln!(f, "Batches: {}", self.batches)?;
        writeln!(f, "Events sent: {}", self.events_sent)?;
        writeln!(
            f,
            "Events dropped: {} ({:.2}%)",
            self.events_dropped, self.drop_rate
        )?;
        writeln!(f, "Still pending: {}", self.pending)?;
        writeln!(f, "Queue depth: {}", self.queue_depth)?;
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.2}, std={:.2} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
