//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Metrics Relay - buffer metric events and dispatch them to a site in batches
#[derive(Parser, Debug)]
#[command(
    name = "metrics-relay",
    author,
    version,
    about = "Batched metrics dispatch to a remote site",
    long_about = "Queues metric events, probes the site for metrics support and \n\
                  posts the events in bounded batches from background workers."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "METRICS_RELAY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "METRICS_RELAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Enqueue events and dispatch them to the site
    Run(RunArgs),

    /// Validate configuration file without dispatching
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "relay.toml", env = "METRICS_RELAY_CONFIG")]
    pub config: PathBuf,

    /// Override site base URL from configuration
    #[arg(long, env = "METRICS_RELAY_SITE")]
    pub site: Option<String>,

    /// Override authenticated user from configuration
    #[arg(long, env = "METRICS_RELAY_USER")]
    pub user: Option<String>,

    /// Override session token from configuration
    #[arg(long, env = "METRICS_RELAY_SESSION_TOKEN", hide_env_values = true)]
    pub session_token: Option<String>,

    /// Override number of dispatch workers
    #[arg(long)]
    pub workers: Option<usize>,

    /// Event to enqueue, as `group:name[,key=value...]` (repeatable)
    #[arg(short, long = "event", value_name = "SPEC")]
    pub events: Vec<String>,

    /// Enqueue each event only if its group:name was not seen before
    #[arg(long)]
    pub once: bool,

    /// Seconds to keep dispatching (0 = until the queue is empty)
    #[arg(long, default_value = "0", env = "METRICS_RELAY_DURATION")]
    pub duration: u64,

    /// Validate configuration and exit without dispatching
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "METRICS_RELAY_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
