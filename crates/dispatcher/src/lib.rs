//! # Dispatcher
//!
//! Metric buffering and batched dispatch.
//!
//! Responsibilities:
//! - Buffer `MetricEvent`s from any thread in a shared `MetricQueue`
//! - Drain bounded batches from background workers and POST them to the site
//! - Never block or fail producers, drop batches the site cannot take

pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod hooks;
pub mod metrics;
pub mod queue;
pub mod worker;

pub use contracts::{DispatchHook, MetricEvent, SiteConnection};
pub use connection::HttpConnection;
pub use dispatcher::{create_dispatcher, Dispatcher, DispatcherBuilder};
pub use error::DispatcherError;
pub use hooks::{build_hook, FileHook, LogHook};
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use queue::{EnqueueOutcome, MetricQueue, QueueStats};
pub use worker::{CycleOutcome, DispatchWorker, WorkerExit, WorkerHandle};
