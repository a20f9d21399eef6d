//! Notification: the aggregated report emitted once per dispatched rule.

use serde::{Deserialize, Serialize};

use crate::id::{ActionId, RuleId};
use crate::time::Timestamp;

/// Overall result of one rule dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Every action succeeded (or the rule has no actions).
    Success,
    /// At least one action failed and at least one succeeded.
    Partial,
    /// Every action failed.
    Failure,
}

impl DispatchOutcome {
    /// Derive the outcome from the number of failed actions out of `total`.
    #[must_use]
    pub fn from_counts(failed: usize, total: usize) -> Self {
        if failed == 0 {
            Self::Success
        } else if failed >= total {
            Self::Failure
        } else {
            Self::Partial
        }
    }
}

impl std::fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Partial => "partial",
            Self::Failure => "failure",
        })
    }
}

/// What happened to a single action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionResult {
    Succeeded { message: String, attempts: u32 },
    Failed { error: String, attempts: u32 },
}

impl ActionResult {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Per-action line of a [`Notification`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReport {
    pub action_id: ActionId,
    /// 1-based position in the rule's action list.
    pub position: usize,
    pub summary: String,
    pub result: ActionResult,
}

/// One structured message describing a rule dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub rule_id: RuleId,
    pub rule_name: String,
    pub event_name: String,
    pub outcome: DispatchOutcome,
    pub actions: Vec<ActionReport>,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
}

impl Notification {
    /// Iterate over the reports of failed actions.
    pub fn failures(&self) -> impl Iterator<Item = &ActionReport> {
        self.actions
            .iter()
            .filter(|report| report.result.is_failure())
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "rule \"{}\" triggered by {} ({})",
            self.rule_name, self.event_name, self.outcome
        )?;
        for report in &self.actions {
            match &report.result {
                ActionResult::Succeeded { message, .. } => {
                    write!(
                        f,
                        "\n  #{} {}: ok {message}",
                        report.position, report.summary
                    )?;
                }
                ActionResult::Failed { error, attempts } => write!(
                    f,
                    "\n  #{} {}: failed after {attempts} attempt(s): {error}",
                    report.position, report.summary
                )?,
            }
        }
        Ok(())
    }
}
