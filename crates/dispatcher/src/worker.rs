//! DispatchWorker - background loop draining the queue to the site
//!
//! Lifecycle: probe the site version once, then drain / send / notify / wait
//! until halted. A site below the minimum version ends the worker for good.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use contracts::{
    track_metrics_url, AuthArgs, ContractError, DispatchHook, MetricEvent, MetricsPayload, SiteConnection,
    MIN_METRICS_VERSION,
};

use crate::error::DispatcherError;
use crate::metrics::DispatchMetrics;
use crate::queue::MetricQueue;

/// Why a worker loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// Halt signal observed
    Halted,
    /// Site does not support metrics ingestion
    Unsupported,
}

/// Result of one dispatch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing pending
    Idle,
    /// Batch accepted by the site
    Delivered(usize),
    /// Batch lost to a send failure
    Dropped(usize),
}

/// Single dispatch loop bound to a shared queue
pub struct DispatchWorker<C> {
    id: usize,
    queue: Arc<MetricQueue>,
    connection: Arc<C>,
    hook: Arc<dyn DispatchHook>,
    metrics: Arc<DispatchMetrics>,
    interval: Duration,
    batch_size: usize,
    halt_rx: watch::Receiver<bool>,
}

impl<C: SiteConnection + Sync + 'static> DispatchWorker<C> {
    /// Create a worker and the sender that halts it
    pub fn new(
        id: usize,
        queue: Arc<MetricQueue>,
        connection: Arc<C>,
        hook: Arc<dyn DispatchHook>,
        metrics: Arc<DispatchMetrics>,
        interval: Duration,
        batch_size: usize,
    ) -> (Self, watch::Sender<bool>) {
        let (halt_tx, halt_rx) = watch::channel(false);
        let worker = Self {
            id,
            queue,
            connection,
            hook,
            metrics,
            interval,
            batch_size,
            halt_rx,
        };
        (worker, halt_tx)
    }

    /// Spawn the worker loop onto the current tokio runtime
    pub fn spawn(self, halt_tx: watch::Sender<bool>) -> WorkerHandle {
        let id = self.id;
        let task = tokio::spawn(self.run());
        WorkerHandle { id, halt_tx, task }
    }

    /// Run until halted or until the site turns out not to support metrics
    #[instrument(name = "dispatch_worker_loop", skip(self), fields(worker = self.id))]
    pub async fn run(mut self) -> WorkerExit {
        if !self.probe().await {
            self.metrics.inc_unsupported_exits();
            return WorkerExit::Unsupported;
        }

        debug!(worker = self.id, "Dispatch worker started");

        while !self.is_halted() {
            self.run_cycle().await;
            if self.wait_for_next_cycle().await {
                break;
            }
        }

        debug!(worker = self.id, "Dispatch worker stopped");
        WorkerExit::Halted
    }

    /// Drain one batch, send it and notify the hook
    pub async fn run_cycle(&self) -> CycleOutcome {
        let events = self.queue.drain(Some(self.batch_size));
        if events.is_empty() {
            return CycleOutcome::Idle;
        }

        let count = events.len();
        let batch: Vec<Value> = events.iter().map(MetricEvent::data).collect();

        let outcome = match self.send_batch(&batch).await {
            Ok(()) => {
                self.metrics.record_sent(count);
                debug!(worker = self.id, events = count, "Metrics batch sent");
                CycleOutcome::Delivered(count)
            }
            Err(e) => {
                // Fire and forget: the batch is not requeued
                self.metrics.record_failed(count);
                debug!(worker = self.id, events = count, error = %e, "Metrics batch dropped");
                CycleOutcome::Dropped(count)
            }
        };

        self.notify_hook(&batch);
        outcome
    }

    async fn probe(&self) -> bool {
        match self.connection.server_version().await {
            Ok(Some(version)) if version.supports_metrics() => {
                debug!(worker = self.id, %version, "Site supports metrics");
                true
            }
            Ok(Some(version)) => {
                info!(
                    worker = self.id,
                    %version,
                    minimum = %MIN_METRICS_VERSION,
                    "Site does not support metrics, worker exiting"
                );
                false
            }
            Ok(None) => {
                info!(worker = self.id, "Site reports no version, worker exiting");
                false
            }
            Err(e) => {
                warn!(worker = self.id, error = %e, "Version probe failed, worker exiting");
                false
            }
        }
    }

    async fn send_batch(&self, batch: &[Value]) -> Result<(), ContractError> {
        let session_token = self.connection.session_token().await?;
        let payload = MetricsPayload {
            auth_args: AuthArgs { session_token },
            metrics: batch.to_vec(),
        };
        let body = serde_json::to_vec(&payload)?;
        let url = track_metrics_url(self.connection.base_url());
        self.connection.post_json(&url, body).await
    }

    fn notify_hook(&self, batch: &[Value]) {
        if let Err(e) = self.hook.on_dispatched(batch) {
            self.metrics.inc_hook_failures();
            warn!(worker = self.id, hook = self.hook.name(), error = %e, "Dispatch hook failed");
        }
    }

    fn is_halted(&self) -> bool {
        *self.halt_rx.borrow()
    }

    /// Wait for the interval or the halt signal; returns true when halted
    async fn wait_for_next_cycle(&mut self) -> bool {
        if self.is_halted() {
            return true;
        }

        tokio::select! {
            _ = tokio::time::sleep(self.interval) => self.is_halted(),
            changed = self.halt_rx.changed() => {
                // Sender gone means the owning dispatcher is gone
                changed.is_err() || self.is_halted()
            }
        }
    }
}

/// Handle to a running worker task
pub struct WorkerHandle {
    id: usize,
    halt_tx: watch::Sender<bool>,
    task: JoinHandle<WorkerExit>,
}

impl WorkerHandle {
    pub fn id(&self) -> usize {
        self.id
    }

    /// Ask the worker to stop at its next wait boundary. Does not block.
    pub fn halt(&self) {
        self.halt_tx.send_replace(true);
    }

    pub fn is_halted(&self) -> bool {
        *self.halt_tx.borrow()
    }

    /// Whether the worker loop has returned
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the worker loop to return
    pub async fn join(self) -> Result<WorkerExit, DispatcherError> {
        self.task.await.map_err(|e| DispatcherError::WorkerJoin {
            worker_id: self.id,
            message: e.to_string(),
        })
    }
}

impl std::fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("id", &self.id)
            .field("halted", &self.is_halted())
            .field("finished", &self.is_finished())
            .finish()
    }
}
