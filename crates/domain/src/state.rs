//! Live state: the production tool snapshot conditions are evaluated against.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Last known state of the production tool.
///
/// The well-known fields are addressed by their camelCase names; anything else
/// (viewer count, custom counters) lives in `values`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LiveState {
    pub current_program_scene: Option<String>,
    pub current_preview_scene: Option<String>,
    pub stream_active: bool,
    pub record_active: bool,
    pub values: Map<String, Value>,
}

impl LiveState {
    /// Resolve a field by name.
    ///
    /// Returns `None` when the field is unknown or, for scenes, not yet known.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "currentProgramScene" => self.current_program_scene.clone().map(Value::String),
            "currentPreviewScene" => self.current_preview_scene.clone().map(Value::String),
            "streamActive" => Some(Value::Bool(self.stream_active)),
            "recordActive" => Some(Value::Bool(self.record_active)),
            other => self.values.get(other).cloned(),
        }
    }

    /// Set a free-form value.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_resolve_well_known_fields() {
        let state = LiveState {
            current_program_scene: Some("Game".to_string()),
            stream_active: true,
            ..LiveState::default()
        };
        assert_eq!(state.field("currentProgramScene"), Some(json!("Game")));
        assert_eq!(state.field("streamActive"), Some(json!(true)));
        assert_eq!(state.field("recordActive"), Some(json!(false)));
        assert_eq!(state.field("currentPreviewScene"), None);
    }

    #[test]
    fn should_fall_back_to_extra_values() {
        let state = LiveState::default().with_value("viewerCount", 150);
        assert_eq!(state.field("viewerCount"), Some(json!(150)));
        assert_eq!(state.field("followerCount"), None);
    }

    #[test]
    fn should_deserialize_partial_state_with_camel_case_keys() {
        let state: LiveState = serde_json::from_value(json!({
            "currentProgramScene": "Intro",
            "values": {"viewerCount": 12}
        }))
        .unwrap();
        assert_eq!(state.current_program_scene.as_deref(), Some("Intro"));
        assert!(!state.stream_active);
        assert_eq!(state.field("viewerCount"), Some(json!(12)));
    }
}
