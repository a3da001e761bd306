//! RelayConfig - Config Loader output
//!
//! Describes the remote site, the dispatch pool and the post-dispatch hook.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

/// Seconds a worker waits between dispatch cycles
pub const DISPATCH_INTERVAL_SECS: f64 = 5.0;

/// Events sent per request. The collector rejects larger batches.
pub const DISPATCH_BATCH_SIZE: usize = 10;

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete relay configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RelayConfig {
    #[serde(default)]
    pub version: ConfigVersion,

    /// Remote site
    #[validate(nested)]
    pub site: SiteConfig,

    /// Worker pool
    #[serde(default)]
    #[validate(nested)]
    pub dispatch: DispatchConfig,

    /// Post-dispatch hook
    #[serde(default)]
    pub hook: HookConfig,
}

/// Remote site the metrics are posted to
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SiteConfig {
    /// Base URL, e.g. `https://studio.example.com`
    #[validate(url)]
    pub base_url: String,

    /// Authenticated user; dispatch does not start without one
    #[serde(default)]
    pub user: Option<String>,

    /// Session token sent in `auth_args`
    #[serde(default)]
    pub session_token: String,

    /// Proxy URL handed to the HTTP client as-is
    #[serde(default)]
    pub proxy: Option<String>,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl SiteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Dispatch worker pool settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DispatchConfig {
    /// Number of workers started by the dispatcher
    #[serde(default = "default_workers")]
    #[validate(range(min = 1))]
    pub workers: usize,

    /// Seconds between dispatch cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: f64,

    /// Events per request, capped at [`DISPATCH_BATCH_SIZE`]
    #[serde(default = "default_batch_size")]
    #[validate(range(min = 1, max = 10))]
    pub batch_size: usize,
}

fn default_workers() -> usize {
    1
}

fn default_interval_secs() -> f64 {
    DISPATCH_INTERVAL_SECS
}

fn default_batch_size() -> usize {
    DISPATCH_BATCH_SIZE
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            interval_secs: default_interval_secs(),
            batch_size: default_batch_size(),
        }
    }
}

impl DispatchConfig {
    /// Wait between cycles; non-finite or negative values fall back to the default
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.interval_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(DISPATCH_INTERVAL_SECS))
    }

    /// Batch size clamped to `1..=DISPATCH_BATCH_SIZE`
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.clamp(1, DISPATCH_BATCH_SIZE)
    }
}

/// Post-dispatch hook selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookConfig {
    #[serde(default)]
    pub kind: HookKind,

    /// Output file for [`HookKind::File`]
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Hook kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    /// No hook
    None,
    /// Log every attempted batch via tracing
    #[default]
    Log,
    /// Append every attempted batch to a JSON Lines file
    File,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_defaults() {
        let config = DispatchConfig::default();
        assert_eq!(config.workers, 1);
        assert_eq!(config.interval(), Duration::from_secs(5));
        assert_eq!(config.effective_batch_size(), 10);
    }

    #[test]
    fn test_batch_size_capped() {
        let config = DispatchConfig {
            batch_size: 500,
            ..Default::default()
        };
        assert_eq!(config.effective_batch_size(), DISPATCH_BATCH_SIZE);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_interval_falls_back() {
        let config = DispatchConfig {
            interval_secs: -1.0,
            ..Default::default()
        };
        assert_eq!(config.interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_minimal_toml() {
        let config: RelayConfig = toml::from_str(
            r#"
[site]
base_url = "https://studio.example.com"
"#,
        )
        .unwrap();
        assert_eq!(config.site.timeout_secs, 30);
        assert_eq!(config.dispatch.batch_size, 10);
        assert_eq!(config.hook.kind, HookKind::Log);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_url_rejected() {
        let config: RelayConfig = toml::from_str(
            r#"
[site]
base_url = "not a url"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}
