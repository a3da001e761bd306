//! Metric event model
//!
//! A metric event is a named occurrence (`group` + `name`) carrying a free-form
//! property map. The property map always holds the default `event_type` key.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Property key always present on an event
pub const EVENT_TYPE_KEY: &str = "event_type";

/// Default value stored under [`EVENT_TYPE_KEY`]
pub const DEFAULT_EVENT_TYPE: &str = "event";

/// A single telemetry event destined for the remote collector.
///
/// `group` and `name` are fixed at construction. Properties can still be
/// appended until the event is handed to a queue, which takes ownership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEvent {
    #[serde(rename = "event_group")]
    group: String,

    #[serde(rename = "event_name")]
    name: String,

    #[serde(rename = "event_property")]
    properties: Map<String, Value>,
}

impl MetricEvent {
    /// Create an event with only the default `event_type` property
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        let mut properties = Map::new();
        properties.insert(
            EVENT_TYPE_KEY.to_string(),
            Value::String(DEFAULT_EVENT_TYPE.to_string()),
        );
        Self {
            group: group.into(),
            name: name.into(),
            properties,
        }
    }

    /// Create an event and merge the given properties over the defaults
    pub fn with_properties<I, K, V>(
        group: impl Into<String>,
        name: impl Into<String>,
        properties: I,
    ) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut event = Self::new(group, name);
        for (key, value) in properties {
            event.add_property(key, value);
        }
        event
    }

    /// Builder-style variant of [`MetricEvent::add_property`]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add_property(key, value);
        self
    }

    /// Insert or overwrite a property
    pub fn add_property(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Dedup identity: `group:name`.
    ///
    /// Properties are deliberately not part of the identity, so two events
    /// with the same group and name collide under `log_once`.
    pub fn identity(&self) -> String {
        format!("{}:{}", self.group, self.name)
    }

    /// Wire representation sent to the collector and to dispatch hooks
    pub fn data(&self) -> Value {
        let mut object = Map::with_capacity(3);
        object.insert("event_group".to_string(), Value::String(self.group.clone()));
        object.insert("event_name".to_string(), Value::String(self.name.clone()));
        object.insert(
            "event_property".to_string(),
            Value::Object(self.properties.clone()),
        );
        Value::Object(object)
    }
}

impl std::fmt::Display for MetricEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_event_type() {
        let event = MetricEvent::new("Toolkit", "Launched Action");
        assert_eq!(
            event.properties().get(EVENT_TYPE_KEY),
            Some(&json!(DEFAULT_EVENT_TYPE))
        );
    }

    #[test]
    fn test_identity_ignores_properties() {
        let a = MetricEvent::new("Toolkit", "Opened").with_property("app", "nuke");
        let b = MetricEvent::new("Toolkit", "Opened").with_property("app", "maya");
        assert_eq!(a.identity(), b.identity());
        assert_eq!(a.identity(), "Toolkit:Opened");
    }

    #[test]
    fn test_data_shape() {
        let event = MetricEvent::with_properties(
            "Engine",
            "Started",
            [("version", json!("v1.2.3")), ("count", json!(3))],
        );
        assert_eq!(
            event.data(),
            json!({
                "event_group": "Engine",
                "event_name": "Started",
                "event_property": {
                    "event_type": "event",
                    "version": "v1.2.3",
                    "count": 3
                }
            })
        );
    }

    #[test]
    fn test_property_can_override_event_type() {
        let event = MetricEvent::new("Engine", "Crashed").with_property(EVENT_TYPE_KEY, "error");
        assert_eq!(event.properties()[EVENT_TYPE_KEY], json!("error"));
    }

    #[test]
    fn test_serde_matches_data() {
        let event = MetricEvent::new("App", "Closed").with_property("ok", true);
        assert_eq!(serde_json::to_value(&event).unwrap(), event.data());
    }
}
