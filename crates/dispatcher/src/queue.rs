//! MetricQueue - shared FIFO buffer between producers and dispatch workers
//!
//! One instance is created by the host and shared through `Arc`. It outlives
//! dispatcher stop/start cycles, so undelivered events wait for the next pool.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;
use tracing::debug;

use contracts::MetricEvent;

use crate::error::DispatcherError;

/// Result of a single enqueue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Event appended to the tail
    Queued,
    /// `log_once` was set and the identity had already been seen
    Suppressed,
}

/// Counters kept alongside the queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub pending: usize,
    pub seen_identities: usize,
    pub enqueued: u64,
    pub suppressed: u64,
    pub drained: u64,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<MetricEvent>,
    // Grows for the process lifetime, never pruned.
    seen: HashSet<String>,
    enqueued: u64,
    suppressed: u64,
    drained: u64,
}

/// Unbounded FIFO of pending metric events with a `log_once` identity set.
///
/// Both the queue and the identity set sit behind a single lock; every
/// operation holds it for O(1) or O(batch).
#[derive(Debug, Default)]
pub struct MetricQueue {
    state: Mutex<QueueState>,
}

impl MetricQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event for dispatch.
    ///
    /// With `log_once`, the event is dropped if an event with the same
    /// identity was enqueued before, with or without `log_once`.
    /// Never fails from the caller's point of view.
    pub fn enqueue(&self, event: MetricEvent, log_once: bool) {
        if let Err(e) = self.try_enqueue(event, log_once) {
            debug!(error = %e, "Metric enqueue failed, event discarded");
        }
    }

    /// Build an event from its parts and enqueue it
    pub fn log_event<I, K, V>(
        &self,
        group: impl Into<String>,
        name: impl Into<String>,
        properties: I,
        log_once: bool,
    ) where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.enqueue(
            MetricEvent::with_properties(group, name, properties),
            log_once,
        );
    }

    /// Typed variant of [`MetricQueue::enqueue`]
    pub fn try_enqueue(
        &self,
        event: MetricEvent,
        log_once: bool,
    ) -> Result<EnqueueOutcome, DispatcherError> {
        let identity = event.identity();
        let mut state = self.lock()?;

        if log_once && state.seen.contains(&identity) {
            state.suppressed += 1;
            return Ok(EnqueueOutcome::Suppressed);
        }

        state.pending.push_back(event);
        state.seen.insert(identity);
        state.enqueued += 1;
        Ok(EnqueueOutcome::Queued)
    }

    /// Remove up to `max_count` events from the head, oldest first.
    ///
    /// `None`, `Some(0)` or a count above the pending length returns every
    /// pending event. Never fails; an empty queue yields an empty batch.
    pub fn drain(&self, max_count: Option<usize>) -> Vec<MetricEvent> {
        self.try_drain(max_count).unwrap_or_else(|e| {
            debug!(error = %e, "Metric drain failed");
            Vec::new()
        })
    }

    /// Typed variant of [`MetricQueue::drain`]
    pub fn try_drain(&self, max_count: Option<usize>) -> Result<Vec<MetricEvent>, DispatcherError> {
        let mut state = self.lock()?;
        let pending = state.pending.len();

        let count = match max_count {
            Some(n) if n > 0 && n < pending => n,
            _ => pending,
        };

        let batch: Vec<MetricEvent> = state.pending.drain(..count).collect();
        state.drained += batch.len() as u64;
        Ok(batch)
    }

    /// Number of pending events
    pub fn len(&self) -> usize {
        self.lock().map(|s| s.pending.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct identities ever enqueued
    pub fn seen_count(&self) -> usize {
        self.lock().map(|s| s.seen.len()).unwrap_or(0)
    }

    /// Whether an identity has been enqueued before
    pub fn has_seen(&self, identity: &str) -> bool {
        self.lock()
            .map(|s| s.seen.contains(identity))
            .unwrap_or(false)
    }

    pub fn stats(&self) -> QueueStats {
        self.lock()
            .map(|s| QueueStats {
                pending: s.pending.len(),
                seen_identities: s.seen.len(),
                enqueued: s.enqueued,
                suppressed: s.suppressed,
                drained: s.drained,
            })
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, QueueState>, DispatcherError> {
        self.state.lock().map_err(|_| DispatcherError::QueuePoisoned)
    }
}
