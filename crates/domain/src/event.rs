//! Event: something the production tool or the automation bot reported.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::time::{self, Timestamp};

/// An incoming event as delivered to the engine.
///
/// The name follows the production tool's vocabulary
/// (`"CurrentProgramSceneChanged"`, `"StreamStateChanged"`, …) and the payload
/// is passed to trigger filters and condition resolution untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingEvent {
    pub name: String,
    #[serde(default)]
    pub payload: Map<String, Value>,
    #[serde(default = "time::now")]
    pub received_at: Timestamp,
}

impl IncomingEvent {
    /// Create an event stamped with the current time.
    #[must_use]
    pub fn new(name: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            payload,
            received_at: time::now(),
        }
    }

    /// Create an event without payload.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, Map::new())
    }

    /// Add a payload entry.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }
}
