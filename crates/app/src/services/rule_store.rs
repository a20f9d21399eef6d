//! Rule store: the in-memory, ordered list of rules.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use stagehand_domain::automation::{AutomationRule, RulePatch};
use stagehand_domain::error::{NotFoundError, StagehandError, ValidationError};
use stagehand_domain::id::RuleId;

/// Ordered, synchronous store of [`AutomationRule`]s.
///
/// Position in the store is the evaluation priority: new rules are appended,
/// edits keep their position.
#[derive(Default)]
pub struct RuleStore {
    rules: RwLock<Vec<AutomationRule>>,
}

impl RuleStore {
    #[must_use]
    pub fn new(rules: Vec<AutomationRule>) -> Self {
        Self {
            rules: RwLock::new(rules),
        }
    }

    /// Append a rule.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the rule is invalid or its id is
    /// already taken.
    pub fn add(&self, rule: AutomationRule) -> Result<AutomationRule, StagehandError> {
        rule.validate()?;
        let mut rules = self.write();
        if rules.iter().any(|existing| existing.id == rule.id) {
            return Err(ValidationError::DuplicateRule(rule.id).into());
        }
        rules.push(rule.clone());
        Ok(rule)
    }

    /// Apply a partial edit.
    ///
    /// # Errors
    ///
    /// Returns [`StagehandError::NotFound`] for an unknown id, or the
    /// validation error of the edited rule.
    pub fn update(&self, id: RuleId, patch: RulePatch) -> Result<AutomationRule, StagehandError> {
        let mut rules = self.write();
        let rule = find_mut(&mut rules, id)?;
        rule.apply(patch)?;
        Ok(rule.clone())
    }

    /// Remove a rule and return it.
    ///
    /// # Errors
    ///
    /// Returns [`StagehandError::NotFound`] for an unknown id.
    pub fn remove(&self, id: RuleId) -> Result<AutomationRule, StagehandError> {
        let mut rules = self.write();
        let position = rules
            .iter()
            .position(|rule| rule.id == id)
            .ok_or_else(|| not_found(id))?;
        Ok(rules.remove(position))
    }

    /// Flip a rule's enabled flag.
    ///
    /// # Errors
    ///
    /// Returns [`StagehandError::NotFound`] for an unknown id.
    pub fn toggle(&self, id: RuleId) -> Result<AutomationRule, StagehandError> {
        let mut rules = self.write();
        let rule = find_mut(&mut rules, id)?;
        rule.toggle();
        Ok(rule.clone())
    }

    /// # Errors
    ///
    /// Returns [`StagehandError::NotFound`] for an unknown id.
    pub fn get(&self, id: RuleId) -> Result<AutomationRule, StagehandError> {
        self.read()
            .iter()
            .find(|rule| rule.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    /// Snapshot of all rules in store order.
    #[must_use]
    pub fn list(&self) -> Vec<AutomationRule> {
        self.read().clone()
    }

    /// Replace the whole content, e.g. after loading from the repository.
    pub fn replace(&self, rules: Vec<AutomationRule>) {
        *self.write() = rules;
    }

    /// Copy `trigger_count` / `last_triggered` from the engine's copies of the
    /// rules. Counters only ever move forward.
    pub fn absorb_counters(&self, fired: &[AutomationRule]) {
        let mut rules = self.write();
        for source in fired {
            if let Some(rule) = rules.iter_mut().find(|rule| rule.id == source.id) {
                rule.trigger_count = rule.trigger_count.max(source.trigger_count);
                rule.last_triggered = rule.last_triggered.max(source.last_triggered);
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<AutomationRule>> {
        self.rules.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<AutomationRule>> {
        self.rules.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn find_mut(
    rules: &mut [AutomationRule],
    id: RuleId,
) -> Result<&mut AutomationRule, StagehandError> {
    rules
        .iter_mut()
        .find(|rule| rule.id == id)
        .ok_or_else(|| not_found(id))
}

fn not_found(id: RuleId) -> StagehandError {
    NotFoundError {
        entity: "Rule",
        id: id.to_string(),
    }
    .into()
}
