//! Condition evaluation against live state, the event payload and bot
//! variables.

use serde_json::{Map, Value};
use stagehand_domain::automation::{AutomationCondition, ConditionKind};
use stagehand_domain::state::LiveState;

/// Everything a condition can read from.
pub(crate) struct EvaluationContext<'a> {
    pub state: &'a LiveState,
    pub payload: &'a Map<String, Value>,
    pub variables: &'a Map<String, Value>,
}

impl EvaluationContext<'_> {
    /// Resolve the condition's field.
    ///
    /// - scene / stream: live state
    /// - source: event payload, then live state
    /// - custom: event payload, then bot variables
    pub fn resolve(&self, condition: &AutomationCondition) -> Option<Value> {
        let field = condition.field.as_str();
        match condition.kind {
            ConditionKind::Scene | ConditionKind::Stream => self.state.field(field),
            ConditionKind::Source => self
                .payload
                .get(field)
                .cloned()
                .or_else(|| self.state.field(field)),
            ConditionKind::Custom => self
                .payload
                .get(field)
                .or_else(|| self.variables.get(field))
                .cloned(),
        }
    }

    /// AND over all conditions, stopping at the first that does not hold.
    pub fn all_hold(&self, conditions: &[AutomationCondition]) -> bool {
        conditions.iter().all(|condition| {
            let holds = condition.holds(self.resolve(condition).as_ref());
            if !holds {
                tracing::debug!(%condition, "condition not met");
            }
            holds
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stagehand_domain::automation::Operator;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn condition(
        kind: ConditionKind,
        field: &str,
        operator: Operator,
        value: &str,
    ) -> AutomationCondition {
        AutomationCondition::new(kind, field, operator, value)
    }

    #[test]
    fn should_hold_vacuously_when_no_conditions() {
        let state = LiveState::default();
        let empty = Map::new();
        let ctx = EvaluationContext {
            state: &state,
            payload: &empty,
            variables: &empty,
        };
        assert!(ctx.all_hold(&[]));
    }

    #[test]
    fn should_read_scene_fields_from_live_state() {
        let state = LiveState {
            current_program_scene: Some("Game".to_string()),
            ..LiveState::default()
        };
        let payload = object(json!({"currentProgramScene": "Menu"}));
        let empty = Map::new();
        let ctx = EvaluationContext {
            state: &state,
            payload: &payload,
            variables: &empty,
        };
        let c = condition(
            ConditionKind::Scene,
            "currentProgramScene",
            Operator::Equals,
            "Game",
        );
        assert!(ctx.all_hold(&[c]));
    }

    #[test]
    fn should_prefer_payload_for_source_fields() {
        let state = LiveState::default().with_value("inputName", "Camera");
        let payload = object(json!({"inputName": "Desk Mic"}));
        let empty = Map::new();
        let ctx = EvaluationContext {
            state: &state,
            payload: &payload,
            variables: &empty,
        };
        let c = condition(
            ConditionKind::Source,
            "inputName",
            Operator::Contains,
            "mic",
        );
        assert!(ctx.all_hold(&[c]));
    }

    #[test]
    fn should_fall_back_to_variables_for_custom_fields() {
        let state = LiveState::default();
        let payload = Map::new();
        let variables = object(json!({"fileExists": true}));
        let ctx = EvaluationContext {
            state: &state,
            payload: &payload,
            variables: &variables,
        };
        let c = condition(
            ConditionKind::Custom,
            "fileExists",
            Operator::Equals,
            "true",
        );
        assert!(ctx.all_hold(&[c]));
    }

    #[test]
    fn should_fail_when_one_of_two_conditions_fails() {
        let state = LiveState::default();
        let payload = object(json!({"viewerCount": 150}));
        let empty = Map::new();
        let ctx = EvaluationContext {
            state: &state,
            payload: &payload,
            variables: &empty,
        };
        let pass = condition(
            ConditionKind::Custom,
            "viewerCount",
            Operator::GreaterThan,
            "100",
        );
        let fail = condition(
            ConditionKind::Custom,
            "viewerCount",
            Operator::LessThan,
            "100",
        );
        assert!(ctx.all_hold(std::slice::from_ref(&pass)));
        assert!(!ctx.all_hold(&[pass, fail]));
    }

    #[test]
    fn should_fail_when_field_cannot_be_resolved() {
        let state = LiveState::default();
        let empty = Map::new();
        let ctx = EvaluationContext {
            state: &state,
            payload: &empty,
            variables: &empty,
        };
        let c = condition(ConditionKind::Stream, "bitrate", Operator::NotEquals, "0");
        assert!(!ctx.all_hold(&[c]));
    }
}
