//! Parsing of `--event group:name[,key=value...]` arguments.

use contracts::MetricEvent;
use serde_json::Value;

use crate::error::CliError;

/// Parse an event spec into a [`MetricEvent`].
///
/// Property values are read as JSON when they parse as JSON
/// (`count=3`, `ok=true`) and kept as strings otherwise.
pub fn parse_event_spec(spec: &str) -> Result<MetricEvent, CliError> {
    let mut parts = spec.split(',');
    let head = parts.next().unwrap_or_default();

    let (group, name) = head
        .split_once(':')
        .map(|(g, n)| (g.trim(), n.trim()))
        .filter(|(g, n)| !g.is_empty() && !n.is_empty())
        .ok_or_else(|| CliError::invalid_event_spec(spec, "expected 'group:name'"))?;

    let mut event = MetricEvent::new(group, name);
    for property in parts {
        let (key, raw) = property.split_once('=').ok_or_else(|| {
            CliError::invalid_event_spec(spec, format!("expected key=value, got '{property}'"))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(CliError::invalid_event_spec(spec, "empty property key"));
        }
        let raw = raw.trim();
        let value = serde_json::from_str::<Value>(raw)
            .unwrap_or_else(|_| Value::String(raw.to_string()));
        event.add_property(key, value);
    }

    Ok(event)
}
