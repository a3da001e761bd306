//! `run` command implementation.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use contracts::{MetricEvent, RelayConfig};
use dispatcher::{create_dispatcher, MetricQueue, MetricsSnapshot, QueueStats};
use observability::RelayStatsAggregator;

use super::event_spec::parse_event_spec;
use crate::cli::RunArgs;
use crate::error::CliError;

/// How often queue and dispatch counters are sampled
const SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

/// Execute the `run` command
pub async fn run_relay(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut config, args);
    config_loader::ConfigLoader::validate(&config)
        .context("Configuration invalid after command-line overrides")?;

    let events = args
        .events
        .iter()
        .map(|spec| parse_event_spec(spec))
        .collect::<Result<Vec<MetricEvent>, _>>()?;

    info!(
        site = %config.site.base_url,
        workers = config.dispatch.workers,
        batch_size = config.dispatch.effective_batch_size(),
        events = events.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config, &events);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let queue = Arc::new(MetricQueue::new());
    for event in events {
        queue.enqueue(event, args.once);
    }

    let mut dispatcher = create_dispatcher(&config, Arc::clone(&queue))
        .context("Failed to create dispatcher")?;
    dispatcher.start();
    observability::record_dispatcher_state(dispatcher.is_dispatching(), dispatcher.worker_count());

    if !dispatcher.is_dispatching() {
        warn!("Dispatcher did not start (no authenticated user?), events stay queued");
    }

    let started = Instant::now();
    let deadline = (args.duration > 0).then(|| Duration::from_secs(args.duration));
    let mut aggregator = RelayStatsAggregator::new();
    let shutdown_signal = setup_shutdown_signal();
    tokio::pin!(shutdown_signal);

    loop {
        tokio::select! {
            _ = tokio::time::sleep(SAMPLE_INTERVAL) => {}
            _ = &mut shutdown_signal => {
                warn!("Received shutdown signal, stopping dispatch...");
                break;
            }
        }

        let queue_stats = queue.stats();
        let dispatch = dispatcher.metrics();
        observability::record_queue_stats(&queue_stats);
        observability::record_dispatch_metrics(&dispatch);
        aggregator.update(queue_stats, dispatch);

        let finished = match deadline {
            Some(limit) => started.elapsed() >= limit,
            None => {
                !dispatcher.is_dispatching()
                    || dispatcher.workers().iter().all(|w| w.is_finished())
                    || queue_settled(&queue_stats, &dispatch)
            }
        };
        if finished {
            break;
        }
    }

    let metrics = dispatcher.metrics_handle();
    let exits = dispatcher.shutdown().await;
    aggregator.update(queue.stats(), metrics.snapshot());
    info!(workers = exits.len(), "Dispatcher stopped");

    let summary = aggregator.summary(started.elapsed());
    println!("{summary}");

    info!("Metrics relay finished");
    Ok(())
}

/// Nothing pending and every drained event has been attempted
fn queue_settled(queue: &QueueStats, dispatch: &MetricsSnapshot) -> bool {
    queue.pending == 0 && queue.drained == dispatch.events_sent + dispatch.events_dropped
}

fn apply_overrides(config: &mut RelayConfig, args: &RunArgs) {
    if let Some(ref site) = args.site {
        info!(site = %site, "Overriding site URL from CLI");
        config.site.base_url = site.clone();
    }
    if let Some(ref user) = args.user {
        info!(user = %user, "Overriding user from CLI");
        config.site.user = Some(user.clone());
    }
    if let Some(ref token) = args.session_token {
        config.site.session_token = token.clone();
    }
    if let Some(workers) = args.workers {
        info!(workers, "Overriding worker count from CLI");
        config.dispatch.workers = workers;
    }
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &RelayConfig, events: &[MetricEvent]) {
    println!("\n=== Configuration Summary ===\n");
    println!("Site:");
    println!("  URL: {}", config.site.base_url);
    println!("  User: {}", config.site.user.as_deref().unwrap_or("<none>"));
    if let Some(ref proxy) = config.site.proxy {
        println!("  Proxy: {}", proxy);
    }

    println!("\nDispatch:");
    println!("  Workers: {}", config.dispatch.workers);
    println!("  Interval: {:?}", config.dispatch.interval());
    println!("  Batch size: {}", config.dispatch.effective_batch_size());
    println!("  Hook: {:?}", config.hook.kind);

    if !events.is_empty() {
        println!("\nEvents ({}):", events.len());
        for event in events {
            println!("  - {} ({} properties)", event, event.properties().len());
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use crate::cli::{Cli, Commands};

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["metrics-relay", "run"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Run(args) => args,
            _ => unreachable!(),
        }
    }

    fn base_config() -> RelayConfig {
        config_loader::ConfigLoader::load_from_str(
            "[site]\nbase_url = \"https://studio.example.com\"\n",
            config_loader::ConfigFormat::Toml,
        )
        .unwrap()
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = base_config();
        let args = run_args(&[
            "--site",
            "https://other.example.com",
            "--user",
            "jdoe",
            "--session-token",
            "tok",
            "--workers",
            "3",
        ]);

        apply_overrides(&mut config, &args);
        assert_eq!(config.site.base_url, "https://other.example.com");
        assert_eq!(config.site.user.as_deref(), Some("jdoe"));
        assert_eq!(config.site.session_token, "tok");
        assert_eq!(config.dispatch.workers, 3);
    }

    #[test]
    fn test_queue_settled() {
        let empty = QueueStats::default();
        assert!(queue_settled(&empty, &MetricsSnapshot::default()));

        let in_flight = QueueStats {
            pending: 0,
            drained: 10,
            enqueued: 10,
            ..Default::default()
        };
        assert!(!queue_settled(&in_flight, &MetricsSnapshot::default()));

        let attempted = MetricsSnapshot {
            batch_count: 1,
            events_sent: 7,
            events_dropped: 3,
            ..Default::default()
        };
        assert!(queue_settled(&in_flight, &attempted));

        let waiting = QueueStats {
            pending: 4,
            ..in_flight
        };
        assert!(!queue_settled(&waiting, &attempted));
    }

    #[tokio::test]
    async fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let args = run_args(&["--config", path.to_str().unwrap()]);
        let err = run_relay(&args).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_dry_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.toml");
        std::fs::write(
            &path,
            "[site]\nbase_url = \"https://studio.example.com\"\nuser = \"jdoe\"\n",
        )
        .unwrap();

        let args = run_args(&[
            "--config",
            path.to_str().unwrap(),
            "--event",
            "App:Opened,count=1",
            "--dry-run",
        ]);
        assert!(run_relay(&args).await.is_ok());
    }
}
