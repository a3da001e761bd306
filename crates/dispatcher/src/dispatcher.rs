//! Dispatcher - lifecycle manager for the dispatch worker pool

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, error, info, instrument, warn};

use contracts::{
    DispatchConfig, DispatchHook, IdentityProvider, NoopHook, RelayConfig, SiteConnection,
    StaticIdentity,
};

use crate::connection::HttpConnection;
use crate::error::DispatcherError;
use crate::hooks::build_hook;
use crate::metrics::{DispatchMetrics, MetricsSnapshot};
use crate::queue::MetricQueue;
use crate::worker::{DispatchWorker, WorkerExit, WorkerHandle};

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder<C> {
    queue: Arc<MetricQueue>,
    connection: Arc<C>,
    identity: Arc<dyn IdentityProvider>,
    hook: Arc<dyn DispatchHook>,
    config: DispatchConfig,
}

impl<C: SiteConnection + Sync + 'static> DispatcherBuilder<C> {
    /// Start from a queue and a site connection.
    ///
    /// Defaults: anonymous identity (so `start` is a no-op until one is set),
    /// no hook, default dispatch settings.
    pub fn new(queue: Arc<MetricQueue>, connection: Arc<C>) -> Self {
        Self {
            queue,
            connection,
            identity: Arc::new(StaticIdentity::anonymous()),
            hook: Arc::new(NoopHook),
            config: DispatchConfig::default(),
        }
    }

    pub fn identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = identity;
        self
    }

    pub fn hook(mut self, hook: Arc<dyn DispatchHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Dispatcher<C> {
        Dispatcher {
            queue: self.queue,
            connection: self.connection,
            identity: self.identity,
            hook: self.hook,
            config: self.config,
            metrics: Arc::new(DispatchMetrics::new()),
            workers: Vec::new(),
            dispatching: false,
        }
    }
}

/// Owns the dispatch workers draining a shared [`MetricQueue`].
///
/// `start` and `stop` are meant to be driven from one control thread.
pub struct Dispatcher<C> {
    queue: Arc<MetricQueue>,
    connection: Arc<C>,
    identity: Arc<dyn IdentityProvider>,
    hook: Arc<dyn DispatchHook>,
    config: DispatchConfig,
    metrics: Arc<DispatchMetrics>,
    workers: Vec<WorkerHandle>,
    dispatching: bool,
}

impl<C: SiteConnection + Sync + 'static> Dispatcher<C> {
    /// Create an idle dispatcher; shorthand for [`DispatcherBuilder`]
    pub fn new(
        queue: Arc<MetricQueue>,
        connection: Arc<C>,
        identity: Arc<dyn IdentityProvider>,
        hook: Arc<dyn DispatchHook>,
        config: DispatchConfig,
    ) -> Self {
        DispatcherBuilder::new(queue, connection)
            .identity(identity)
            .hook(hook)
            .config(config)
            .build()
    }

    /// Spin up the configured number of workers.
    ///
    /// No-op when already dispatching, when no authenticated user is
    /// available, or when called outside a tokio runtime.
    #[instrument(name = "dispatcher_start", skip(self), fields(workers = self.config.workers))]
    pub fn start(&mut self) {
        if self.dispatching {
            debug!("Metrics dispatching already started. Doing nothing.");
            return;
        }

        let Some(user) = self.identity.current_user() else {
            debug!("No authenticated user, metrics dispatch not started");
            return;
        };

        if Handle::try_current().is_err() {
            warn!("No tokio runtime available, metrics dispatch not started");
            return;
        }

        let interval = self.config.interval();
        let batch_size = self.config.effective_batch_size();

        for id in 0..self.config.workers {
            let (worker, halt_tx) = DispatchWorker::new(
                id,
                Arc::clone(&self.queue),
                Arc::clone(&self.connection),
                Arc::clone(&self.hook),
                Arc::clone(&self.metrics),
                interval,
                batch_size,
            );
            let handle = worker.spawn(halt_tx);
            debug!(worker = handle.id(), "Added dispatch worker");
            self.workers.push(handle);
        }

        self.dispatching = !self.workers.is_empty();

        info!(
            user = %user,
            site = %self.connection.base_url(),
            workers = self.workers.len(),
            interval_ms = interval.as_millis() as u64,
            batch_size,
            "Metrics dispatch started"
        );
    }

    /// Signal every worker to halt and forget them.
    ///
    /// Does not wait for in-flight cycles. Safe to call when idle.
    #[instrument(name = "dispatcher_stop", skip(self))]
    pub fn stop(&mut self) {
        for worker in &self.workers {
            worker.halt();
        }

        if self.dispatching {
            info!(workers = self.workers.len(), "Metrics dispatch stopped");
        }

        self.workers.clear();
        self.dispatching = false;
    }

    /// Halt every worker and wait for each loop to return
    #[instrument(name = "dispatcher_shutdown", skip(self))]
    pub async fn shutdown(mut self) -> Vec<WorkerExit> {
        for worker in &self.workers {
            worker.halt();
        }

        let mut exits = Vec::with_capacity(self.workers.len());
        for worker in self.workers.drain(..) {
            match worker.join().await {
                Ok(exit) => exits.push(exit),
                Err(e) => error!(error = %e, "Dispatch worker panicked"),
            }
        }

        self.dispatching = false;
        info!(
            workers = exits.len(),
            pending = self.queue.len(),
            "Dispatcher shutdown complete"
        );
        exits
    }

    /// True if started and dispatching metrics
    pub fn is_dispatching(&self) -> bool {
        self.dispatching
    }

    /// Live worker handles
    pub fn workers(&self) -> &[WorkerHandle] {
        &self.workers
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn queue(&self) -> &Arc<MetricQueue> {
        &self.queue
    }

    /// Counters shared by every worker of this dispatcher
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Shared counter handle, still readable after `shutdown`
    pub fn metrics_handle(&self) -> Arc<DispatchMetrics> {
        Arc::clone(&self.metrics)
    }
}

/// Convenience function to create an HTTP dispatcher from relay config
#[instrument(name = "dispatcher_create", skip(config, queue), fields(site = %config.site.base_url))]
pub fn create_dispatcher(
    config: &RelayConfig,
    queue: Arc<MetricQueue>,
) -> Result<Dispatcher<HttpConnection>, DispatcherError> {
    let connection = HttpConnection::new(&config.site)?;
    let hook = build_hook(&config.hook)?;
    let identity = StaticIdentity::new(config.site.user.clone());

    Ok(DispatcherBuilder::new(queue, Arc::new(connection))
        .identity(Arc::new(identity))
        .hook(hook)
        .config(config.dispatch.clone())
        .build())
}
