//! Automation: trigger → condition → action rules.
//!
//! A rule becomes eligible when an incoming event satisfies its
//! [`AutomationTrigger`], fires when every [`AutomationCondition`] holds and
//! its cooldown has elapsed, and then dispatches its [`AutomationAction`]s in
//! order.

mod action;
mod condition;
mod trigger;

pub use action::{
    ActionTarget, AutomationAction, BotAction, DEFAULT_FILE_VARIABLE, DEFAULT_FOLDER_VARIABLE,
    ToolAction, ToolRequest,
};
pub use condition::{AutomationCondition, ConditionKind, Operator};
pub use trigger::AutomationTrigger;

use serde::{Deserialize, Serialize};

use crate::error::{StagehandError, ValidationError};
use crate::id::RuleId;
use crate::time::{self, Timestamp};

/// A user-defined automation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationRule {
    pub id: RuleId,
    pub name: String,
    pub enabled: bool,
    pub trigger: AutomationTrigger,
    pub conditions: Vec<AutomationCondition>,
    pub actions: Vec<AutomationAction>,
    /// Minimum number of seconds between two firings; `0` disables the gate.
    pub cooldown: u64,
    pub created_at: Timestamp,
    pub last_triggered: Option<Timestamp>,
    pub trigger_count: u64,
}

impl AutomationRule {
    /// Create a builder for constructing an [`AutomationRule`].
    #[must_use]
    pub fn builder() -> AutomationRuleBuilder {
        AutomationRuleBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// A rule without actions is valid; it still fires and is counted.
    ///
    /// # Errors
    ///
    /// Returns [`StagehandError::Validation`] when:
    /// - `name` is blank ([`ValidationError::EmptyName`])
    /// - the trigger event name is blank ([`ValidationError::EmptyEventName`])
    /// - a condition has a blank field ([`ValidationError::EmptyConditionField`])
    /// - an action payload is malformed (see [`AutomationAction::validate`])
    pub fn validate(&self) -> Result<(), StagehandError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.trigger.event_name.trim().is_empty() {
            return Err(ValidationError::EmptyEventName.into());
        }
        if self.conditions.iter().any(|c| c.field.trim().is_empty()) {
            return Err(ValidationError::EmptyConditionField.into());
        }
        for action in &self.actions {
            action.validate()?;
        }
        Ok(())
    }

    /// Whether the cooldown window opened by the last firing is still running
    /// at `now`.
    #[must_use]
    pub fn is_cooling_down(&self, now: Timestamp) -> bool {
        if self.cooldown == 0 {
            return false;
        }
        self.last_triggered
            .is_some_and(|last| now.signed_duration_since(last) < time::seconds(self.cooldown))
    }

    /// Account for a firing at `now`.
    pub fn record_trigger(&mut self, now: Timestamp) {
        self.last_triggered = Some(now);
        self.trigger_count = self.trigger_count.saturating_add(1);
    }

    /// Flip the enabled flag and return the new value.
    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }

    /// Apply an edit, leaving identity, creation time and counters untouched.
    ///
    /// # Errors
    ///
    /// Returns the validation error of the edited rule; `self` is left
    /// unchanged in that case.
    pub fn apply(&mut self, patch: RulePatch) -> Result<(), StagehandError> {
        let mut edited = self.clone();
        if let Some(name) = patch.name {
            edited.name = name;
        }
        if let Some(enabled) = patch.enabled {
            edited.enabled = enabled;
        }
        if let Some(trigger) = patch.trigger {
            edited.trigger = trigger;
        }
        if let Some(conditions) = patch.conditions {
            edited.conditions = conditions;
        }
        if let Some(actions) = patch.actions {
            edited.actions = actions;
        }
        if let Some(cooldown) = patch.cooldown {
            edited.cooldown = cooldown;
        }
        edited.validate()?;
        *self = edited;
        Ok(())
    }
}

/// Partial edit of a rule. `None` fields are kept as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulePatch {
    pub name: Option<String>,
    pub enabled: Option<bool>,
    pub trigger: Option<AutomationTrigger>,
    pub conditions: Option<Vec<AutomationCondition>>,
    pub actions: Option<Vec<AutomationAction>>,
    pub cooldown: Option<u64>,
}

/// Step-by-step builder for [`AutomationRule`].
#[derive(Debug, Default)]
pub struct AutomationRuleBuilder {
    id: Option<RuleId>,
    name: Option<String>,
    enabled: Option<bool>,
    trigger: Option<AutomationTrigger>,
    conditions: Vec<AutomationCondition>,
    actions: Vec<AutomationAction>,
    cooldown: u64,
    created_at: Option<Timestamp>,
    last_triggered: Option<Timestamp>,
    trigger_count: u64,
}

impl AutomationRuleBuilder {
    #[must_use]
    pub fn id(mut self, id: RuleId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn trigger(mut self, trigger: AutomationTrigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    #[must_use]
    pub fn condition(mut self, condition: AutomationCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn conditions(mut self, conditions: impl IntoIterator<Item = AutomationCondition>) -> Self {
        self.conditions.extend(conditions);
        self
    }

    #[must_use]
    pub fn action(mut self, action: AutomationAction) -> Self {
        self.actions.push(action);
        self
    }

    #[must_use]
    pub fn actions(mut self, actions: impl IntoIterator<Item = AutomationAction>) -> Self {
        self.actions.extend(actions);
        self
    }

    #[must_use]
    pub fn cooldown(mut self, seconds: u64) -> Self {
        self.cooldown = seconds;
        self
    }

    #[must_use]
    pub fn created_at(mut self, ts: Timestamp) -> Self {
        self.created_at = Some(ts);
        self
    }

    #[must_use]
    pub fn last_triggered(mut self, ts: Timestamp) -> Self {
        self.last_triggered = Some(ts);
        self
    }

    #[must_use]
    pub fn trigger_count(mut self, count: u64) -> Self {
        self.trigger_count = count;
        self
    }

    /// Consume the builder, validate, and return an [`AutomationRule`].
    ///
    /// # Errors
    ///
    /// Returns [`StagehandError::Validation`] if required fields are missing or empty.
    pub fn build(self) -> Result<AutomationRule, StagehandError> {
        let rule = AutomationRule {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            enabled: self.enabled.unwrap_or(true),
            trigger: self
                .trigger
                .unwrap_or_else(|| AutomationTrigger::new(String::new())),
            conditions: self.conditions,
            actions: self.actions,
            cooldown: self.cooldown,
            created_at: self.created_at.unwrap_or_else(time::now),
            last_triggered: self.last_triggered,
            trigger_count: self.trigger_count,
        };
        rule.validate()?;
        Ok(rule)
    }
}
