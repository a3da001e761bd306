//! LogHook - logs dispatched batch summaries via tracing

use contracts::{ContractError, DispatchHook};
use serde_json::Value;
use tracing::info;

/// Hook that logs every attempted batch
pub struct LogHook {
    name: String,
}

impl LogHook {
    /// Create a new LogHook with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn event_names(metrics: &[Value]) -> Vec<String> {
        metrics
            .iter()
            .map(|m| {
                format!(
                    "{}:{}",
                    m["event_group"].as_str().unwrap_or("?"),
                    m["event_name"].as_str().unwrap_or("?")
                )
            })
            .collect()
    }
}

impl DispatchHook for LogHook {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_dispatched(&self, metrics: &[Value]) -> Result<(), ContractError> {
        info!(
            hook = %self.name,
            count = metrics.len(),
            events = ?Self::event_names(metrics),
            "Metrics batch dispatched"
        );
        Ok(())
    }
}
