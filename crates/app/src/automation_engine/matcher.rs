//! Trigger matching: selects the rules an event can activate.

use serde_json::{Map, Value};
use stagehand_domain::automation::AutomationRule;

/// Indices of the enabled rules whose trigger accepts the event, in store
/// order.
pub(crate) fn candidates(
    rules: &[AutomationRule],
    event_name: &str,
    payload: &Map<String, Value>,
) -> Vec<usize> {
    rules
        .iter()
        .enumerate()
        .filter(|(_, rule)| rule.enabled && rule.trigger.event_name == event_name)
        .filter(|(_, rule)| {
            let accepted = rule.trigger.matches(event_name, payload);
            if !accepted {
                tracing::debug!(rule = %rule.name, trigger = %rule.trigger, "trigger data mismatch");
            }
            accepted
        })
        .map(|(index, _)| index)
        .collect()
}
