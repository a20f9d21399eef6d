//! Rule repository port: persistence for the rule snapshot.

use std::future::Future;

use stagehand_domain::automation::AutomationRule;
use stagehand_domain::error::StagehandError;

/// Loads and saves the whole ordered list of [`AutomationRule`]s.
///
/// The order returned by [`load`](Self::load) is the order passed to the last
/// [`save`](Self::save); it is the evaluation priority of the rules.
pub trait RuleRepository {
    /// Load every persisted rule, in store order.
    fn load(&self) -> impl Future<Output = Result<Vec<AutomationRule>, StagehandError>> + Send;

    /// Replace the persisted rules with `rules`.
    fn save(
        &self,
        rules: Vec<AutomationRule>,
    ) -> impl Future<Output = Result<(), StagehandError>> + Send;
}

impl<T: RuleRepository + Send + Sync> RuleRepository for std::sync::Arc<T> {
    fn load(&self) -> impl Future<Output = Result<Vec<AutomationRule>, StagehandError>> + Send {
        (**self).load()
    }

    fn save(
        &self,
        rules: Vec<AutomationRule>,
    ) -> impl Future<Output = Result<(), StagehandError>> + Send {
        (**self).save(rules)
    }
}
