//! Trigger: the event name and payload filter that make a rule eligible.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::value;

/// Describes which incoming events can activate a rule.
///
/// `event_data` is a subset filter: every listed key must be present in the
/// event payload with an equal value (compared as text). An empty filter
/// matches any payload. A key whose expected value is `null` or an empty
/// string is treated as "any value" and skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationTrigger {
    /// Name of the event, e.g. `"StreamStateChanged"`.
    pub event_name: String,
    /// Expected payload values, e.g. `{"outputState": "OBS_WEBSOCKET_OUTPUT_STARTED"}`.
    #[serde(default)]
    pub event_data: Map<String, Value>,
}

impl AutomationTrigger {
    /// Create a trigger for `event_name` with an empty payload filter.
    #[must_use]
    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            event_data: Map::new(),
        }
    }

    /// Add an expected payload value to the filter.
    #[must_use]
    pub fn with_filter(mut self, key: impl Into<String>, expected: impl Into<Value>) -> Self {
        self.event_data.insert(key.into(), expected.into());
        self
    }

    /// Check whether an event with this name and payload activates the trigger.
    #[must_use]
    pub fn matches(&self, event_name: &str, payload: &Map<String, Value>) -> bool {
        !self.event_name.is_empty()
            && self.event_name == event_name
            && self.matches_payload(payload)
    }

    /// Check only the payload filter.
    ///
    /// A filter entry holding an array or an object cannot be compared as
    /// text and never matches.
    #[must_use]
    pub fn matches_payload(&self, payload: &Map<String, Value>) -> bool {
        self.event_data.iter().all(|(key, expected)| {
            if is_wildcard(expected) {
                return true;
            }
            if !value::is_scalar(expected) {
                return false;
            }
            payload
                .get(key)
                .is_some_and(|actual| {
                    value::is_scalar(actual) && value::loosely_equal(actual, expected)
                })
        })
    }
}

fn is_wildcard(expected: &Value) -> bool {
    match expected {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

impl std::fmt::Display for AutomationTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.event_name)?;
        if !self.event_data.is_empty() {
            let filter = self
                .event_data
                .iter()
                .map(|(key, expected)| format!("{key}={}", value::as_text(expected)))
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, "[{filter}]")?;
        }
        Ok(())
    }
}
