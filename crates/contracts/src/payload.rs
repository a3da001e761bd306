//! Wire payload for the metrics ingestion endpoint

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::MetricEvent;

/// Path appended to the site base URL for metrics ingestion
pub const TRACK_METRICS_ENDPOINT: &str = "api3/track_metrics/";

/// Authentication block of a metrics request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthArgs {
    pub session_token: String,
}

/// Body POSTed to [`TRACK_METRICS_ENDPOINT`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsPayload {
    pub auth_args: AuthArgs,
    pub metrics: Vec<Value>,
}

impl MetricsPayload {
    /// Build a payload from a drained batch, keeping batch order
    pub fn new(session_token: impl Into<String>, events: &[MetricEvent]) -> Self {
        Self {
            auth_args: AuthArgs {
                session_token: session_token.into(),
            },
            metrics: events.iter().map(MetricEvent::data).collect(),
        }
    }
}

/// Full ingestion URL for a site base URL
pub fn track_metrics_url(base_url: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), TRACK_METRICS_ENDPOINT)
}
