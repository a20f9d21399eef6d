//! Condition: a guard that must hold for a matched rule to fire.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::ConditionId;
use crate::value;

/// Which subject a condition inspects, and therefore where its field is
/// resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    /// Scene-related live state (`currentProgramScene`, `currentPreviewScene`).
    Scene,
    /// Source-related values, looked up in the event payload first.
    Source,
    /// Stream-related live state (`streamActive`, `recordActive`, …).
    Stream,
    /// Free-form values taken from the event payload.
    Custom,
}

/// Comparison applied between the resolved value and the operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
}

impl Operator {
    /// Apply the operator to a resolved value and the textual operand.
    ///
    /// - `equals` / `not_equals` compare both sides as text.
    /// - `contains` is a case-insensitive substring test on strings and a
    ///   membership test on lists; any other value fails.
    /// - `greater_than` / `less_than` compare numerically and fail when
    ///   either side cannot be coerced to a number.
    #[must_use]
    pub fn apply(self, actual: &Value, operand: &str) -> bool {
        match self {
            Self::Equals => value::as_text(actual) == operand,
            Self::NotEquals => value::as_text(actual) != operand,
            Self::Contains => match actual {
                Value::String(text) => text.to_lowercase().contains(&operand.to_lowercase()),
                Value::Array(items) => items.iter().any(|item| value::as_text(item) == operand),
                _ => false,
            },
            Self::GreaterThan => compare(actual, operand).is_some_and(|(a, b)| a > b),
            Self::LessThan => compare(actual, operand).is_some_and(|(a, b)| a < b),
        }
    }
}

fn compare(actual: &Value, operand: &str) -> Option<(f64, f64)> {
    Some((value::as_number(actual)?, value::parse_number(operand)?))
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
        })
    }
}

/// A predicate that must hold for the rule's actions to be dispatched.
///
/// All conditions of a rule must be satisfied (logical AND).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationCondition {
    #[serde(default)]
    pub id: ConditionId,
    #[serde(rename = "type")]
    pub kind: ConditionKind,
    /// Name of the value to resolve, e.g. `"currentProgramScene"`.
    pub field: String,
    pub operator: Operator,
    /// Comparison operand, coerced at evaluation time.
    #[serde(deserialize_with = "value::scalar_as_string")]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AutomationCondition {
    /// Create a condition with a fresh identifier.
    #[must_use]
    pub fn new(
        kind: ConditionKind,
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: ConditionId::new(),
            kind,
            field: field.into(),
            operator,
            value: value.into(),
            description: None,
        }
    }

    /// Evaluate against a resolved field value.
    ///
    /// An unresolved field (`None`) never satisfies the condition, whatever
    /// the operator.
    #[must_use]
    pub fn holds(&self, resolved: Option<&Value>) -> bool {
        resolved.is_some_and(|actual| self.operator.apply(actual, &self.value))
    }
}

impl std::fmt::Display for AutomationCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {:?}", self.field, self.operator, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_compare_equals_as_text() {
        assert!(Operator::Equals.apply(&json!("Game"), "Game"));
        assert!(Operator::Equals.apply(&json!(true), "true"));
        assert!(Operator::Equals.apply(&json!(150), "150"));
        assert!(!Operator::Equals.apply(&json!("Game"), "game"));
    }

    #[test]
    fn should_negate_equality_for_not_equals() {
        assert!(Operator::NotEquals.apply(&json!("Game"), "Menu"));
        assert!(!Operator::NotEquals.apply(&json!(false), "false"));
    }

    #[test]
    fn should_test_substring_case_insensitively_for_contains() {
        assert!(Operator::Contains.apply(&json!("Desk Mic"), "mic"));
        assert!(!Operator::Contains.apply(&json!("Desktop Audio"), "mic"));
    }

    #[test]
    fn should_test_membership_for_contains_on_lists() {
        assert!(Operator::Contains.apply(&json!(["Game", "Menu"]), "Menu"));
        assert!(Operator::Contains.apply(&json!([1, 2, 3]), "2"));
        assert!(!Operator::Contains.apply(&json!(["Game"]), "Intro"));
    }

    #[test]
    fn should_fail_contains_on_other_values() {
        assert!(!Operator::Contains.apply(&json!(42), "4"));
        assert!(!Operator::Contains.apply(&json!({"a": 1}), "a"));
    }

    #[test]
    fn should_compare_numbers_for_greater_and_less_than() {
        assert!(Operator::GreaterThan.apply(&json!(150), "100"));
        assert!(!Operator::GreaterThan.apply(&json!(50), "100"));
        assert!(Operator::LessThan.apply(&json!("50"), "100"));
        assert!(!Operator::LessThan.apply(&json!(100), "100"));
    }

    #[test]
    fn should_fail_numeric_comparison_when_coercion_fails() {
        assert!(!Operator::GreaterThan.apply(&json!("many"), "100"));
        assert!(!Operator::LessThan.apply(&json!(5), "few"));
        assert!(!Operator::GreaterThan.apply(&json!(true), "0"));
    }

    #[test]
    fn should_not_hold_when_field_is_unresolved() {
        let condition = AutomationCondition::new(
            ConditionKind::Custom,
            "missing",
            Operator::NotEquals,
            "x",
        );
        assert!(!condition.holds(None));
    }

    #[test]
    fn should_hold_when_resolved_value_satisfies_operator() {
        let condition = AutomationCondition::new(
            ConditionKind::Stream,
            "viewerCount",
            Operator::GreaterThan,
            "100",
        );
        assert!(condition.holds(Some(&json!(150))));
        assert!(!condition.holds(Some(&json!(50))));
    }

    #[test]
    fn should_deserialize_condition_with_type_tag_and_scalar_value() {
        let condition: AutomationCondition = serde_json::from_value(json!({
            "type": "source",
            "field": "inputMuted",
            "operator": "equals",
            "value": true
        }))
        .unwrap();
        assert_eq!(condition.kind, ConditionKind::Source);
        assert_eq!(condition.operator, Operator::Equals);
        assert_eq!(condition.value, "true");
    }

    #[test]
    fn should_reject_unknown_operator() {
        let result = serde_json::from_value::<AutomationCondition>(json!({
            "type": "custom",
            "field": "x",
            "operator": "matches",
            "value": "y"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn should_display_condition() {
        let condition = AutomationCondition::new(
            ConditionKind::Scene,
            "currentProgramScene",
            Operator::Equals,
            "Game",
        );
        assert_eq!(condition.to_string(), "currentProgramScene equals \"Game\"");
    }
}
