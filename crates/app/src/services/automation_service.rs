//! Automation service: rule management backed by the store and a repository.

use tokio::sync::Mutex;

use stagehand_domain::automation::{AutomationRule, RulePatch};
use stagehand_domain::error::StagehandError;
use stagehand_domain::id::RuleId;

use crate::ports::RuleRepository;
use crate::services::rule_store::RuleStore;

/// Application service for rule CRUD.
///
/// Every mutation updates the in-memory [`RuleStore`] and then saves the whole
/// snapshot through the repository. When the save fails the store is put back
/// the way it was, so the store and the repository never disagree.
/// Re-initializing the engine with [`rules`](Self::rules) is left to the
/// caller.
pub struct AutomationService<R> {
    store: RuleStore,
    repo: R,
    // one mutation (change + save) at a time
    writer: Mutex<()>,
}

impl<R: RuleRepository> AutomationService<R> {
    /// Create a new service backed by the given repository, starting empty.
    pub fn new(repo: R) -> Self {
        Self {
            store: RuleStore::default(),
            repo,
            writer: Mutex::new(()),
        }
    }

    /// Fill the store from the repository.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn load(&self) -> Result<Vec<AutomationRule>, StagehandError> {
        let rules = self.repo.load().await?;
        tracing::info!(count = rules.len(), "rules loaded");
        self.store.replace(rules.clone());
        Ok(rules)
    }

    /// Save the current store content.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn persist(&self) -> Result<(), StagehandError> {
        let _writer = self.writer.lock().await;
        self.repo.save(self.store.list()).await
    }

    /// # Errors
    ///
    /// Returns [`StagehandError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, rule), fields(rule_name = %rule.name))]
    pub async fn create_rule(
        &self,
        rule: AutomationRule,
    ) -> Result<AutomationRule, StagehandError> {
        self.commit(|store| store.add(rule)).await
    }

    /// # Errors
    ///
    /// Returns [`StagehandError::NotFound`] when no rule with `id` exists.
    pub fn get_rule(&self, id: RuleId) -> Result<AutomationRule, StagehandError> {
        self.store.get(id)
    }

    /// All rules in store order.
    #[must_use]
    pub fn rules(&self) -> Vec<AutomationRule> {
        self.store.list()
    }

    /// # Errors
    ///
    /// Returns [`StagehandError::NotFound`] or [`StagehandError::Validation`],
    /// or a storage error propagated from the repository.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_rule(
        &self,
        id: RuleId,
        patch: RulePatch,
    ) -> Result<AutomationRule, StagehandError> {
        self.commit(|store| store.update(id, patch)).await
    }

    /// # Errors
    ///
    /// Returns [`StagehandError::NotFound`] when no rule with `id` exists, or
    /// a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_rule(&self, id: RuleId) -> Result<(), StagehandError> {
        self.commit(|store| store.remove(id).map(drop)).await
    }

    /// # Errors
    ///
    /// Returns [`StagehandError::NotFound`] when no rule with `id` exists, or
    /// a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn toggle_rule(&self, id: RuleId) -> Result<AutomationRule, StagehandError> {
        let toggled = self.commit(|store| store.toggle(id)).await?;
        tracing::info!(rule = %toggled.name, enabled = toggled.enabled, "rule toggled");
        Ok(toggled)
    }

    /// Take over the counters accumulated by the engine.
    pub fn absorb_counters(&self, fired: &[AutomationRule]) {
        self.store.absorb_counters(fired);
    }

    /// Apply `change` to the store and save the result, restoring the
    /// previous content when the save fails.
    async fn commit<T>(
        &self,
        change: impl FnOnce(&RuleStore) -> Result<T, StagehandError>,
    ) -> Result<T, StagehandError> {
        let _writer = self.writer.lock().await;
        let previous = self.store.list();
        let value = change(&self.store)?;
        if let Err(err) = self.repo.save(self.store.list()).await {
            tracing::warn!(error = %err, "saving rules failed, change reverted");
            self.store.replace(previous);
            return Err(err);
        }
        Ok(value)
    }
}
