//! Automation engine: reacts to events by evaluating rules and dispatching
//! their actions.
//!
//! The engine holds a snapshot of the rules handed to
//! [`initialize`](AutomationEngine::initialize). For each event it runs, without
//! suspending:
//!
//! 1. trigger matching (enabled rules, event name, payload filter) in store order
//! 2. condition evaluation (AND, short-circuit)
//! 3. the cooldown gate, which stamps `last_triggered` and bumps `trigger_count`
//!
//! Every rule that passes the gate gets its actions dispatched on a separate
//! tokio task, so [`process_event`](AutomationEngine::process_event) returns
//! before any remote call is made.

mod dispatcher;
mod evaluator;
mod matcher;

pub use dispatcher::RetryPolicy;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::task::JoinHandle;

use stagehand_domain::automation::AutomationRule;
use stagehand_domain::id::RuleId;
use stagehand_domain::notification::Notification;
use stagehand_domain::state::LiveState;
use stagehand_domain::statistics::EngineStatistics;
use stagehand_domain::time::{self, Timestamp};

use crate::ports::{BotClient, Notifier, ToolActionHandler};

use dispatcher::{DispatchJob, Links};
use evaluator::EvaluationContext;

/// Tuning knobs for the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub retry: RetryPolicy,
}

/// What processing one event produced.
#[derive(Debug, Default)]
pub struct EventOutcome {
    /// Rules that passed the cooldown gate, in store order.
    pub fired: Vec<RuleId>,
    /// One in-flight dispatch per fired rule.
    pub dispatches: Vec<JoinHandle<Notification>>,
}

impl EventOutcome {
    /// Wait for every dispatch and collect their notifications.
    pub async fn join(self) -> Vec<Notification> {
        let mut notifications = Vec::with_capacity(self.dispatches.len());
        for handle in self.dispatches {
            match handle.await {
                Ok(notification) => notifications.push(notification),
                Err(err) => tracing::error!(error = %err, "dispatch task failed"),
            }
        }
        notifications
    }
}

/// Result of a dry run of a rule against a sample payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleProbe {
    pub would_trigger: bool,
    pub reason: String,
}

impl RuleProbe {
    fn new(would_trigger: bool, reason: &str) -> Self {
        Self {
            would_trigger,
            reason: reason.to_string(),
        }
    }
}

struct EngineState<T, B, N> {
    rules: Vec<AutomationRule>,
    live: LiveState,
    links: Option<Links<T, B, N>>,
}

/// Rule engine shared behind an [`Arc`] by the ingest paths and the API.
pub struct AutomationEngine<T, B, N> {
    state: Mutex<EngineState<T, B, N>>,
    variables: Arc<Mutex<Map<String, Value>>>,
    options: EngineOptions,
}

impl<T, B, N> AutomationEngine<T, B, N>
where
    T: ToolActionHandler + 'static,
    B: BotClient + 'static,
    N: Notifier + 'static,
{
    /// Create an engine that ignores events until it is initialized.
    #[must_use]
    pub fn new(options: EngineOptions) -> Self {
        Self {
            state: Mutex::new(EngineState {
                rules: Vec::new(),
                live: LiveState::default(),
                links: None,
            }),
            variables: Arc::new(Mutex::new(Map::new())),
            options,
        }
    }

    /// Install the rule snapshot and the collaborators.
    ///
    /// Must be called again whenever the rule list or a client connection
    /// changes. Dispatches already in flight keep the collaborators they
    /// started with. Counters of rules that were already known are kept.
    #[tracing::instrument(skip_all, fields(rules = rules.len(), bot = bot.is_some()))]
    pub fn initialize(&self, rules: Vec<AutomationRule>, bot: Option<B>, tool: T, notifier: N) {
        let mut state = self.lock();
        state.rules = carry_over(&state.rules, rules);
        state.links = Some(Links {
            tool: Arc::new(tool),
            bot: bot.map(Arc::new),
            notifier: Arc::new(notifier),
        });
        tracing::info!("automation engine initialized");
    }

    /// Replace the rule snapshot, keeping the collaborators.
    pub fn update_rules(&self, rules: Vec<AutomationRule>) {
        let mut state = self.lock();
        state.rules = carry_over(&state.rules, rules);
        tracing::debug!(rules = state.rules.len(), "rule snapshot updated");
    }

    /// Replace the production-tool state conditions are evaluated against.
    pub fn update_live_state(&self, live: LiveState) {
        self.lock().live = live;
    }

    #[must_use]
    pub fn live_state(&self) -> LiveState {
        self.lock().live.clone()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.lock().links.is_some()
    }

    /// Process one incoming event at the current time.
    ///
    /// Never fails: problems are logged and reported through notifications.
    pub fn process_event(&self, event_name: &str, payload: &Map<String, Value>) -> EventOutcome {
        self.process_event_at(event_name, payload, time::now())
    }

    /// Process one incoming event as if it arrived at `now`.
    pub fn process_event_at(
        &self,
        event_name: &str,
        payload: &Map<String, Value>,
        now: Timestamp,
    ) -> EventOutcome {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::error!(event = event_name, "no async runtime, event dropped");
            return EventOutcome::default();
        };

        let mut guard = self.lock();
        let state = &mut *guard;
        let Some(links) = state.links.clone() else {
            tracing::warn!(event = event_name, "engine not initialized, event ignored");
            return EventOutcome::default();
        };

        let matched = matcher::candidates(&state.rules, event_name, payload);
        if matched.is_empty() {
            return EventOutcome::default();
        }
        tracing::debug!(
            event = event_name,
            rules = matched.len(),
            "processing event"
        );

        let mut jobs = Vec::new();
        {
            let variables = self
                .variables
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let context = EvaluationContext {
                state: &state.live,
                payload,
                variables: &variables,
            };
            for index in matched {
                let rule = &mut state.rules[index];
                if !context.all_hold(&rule.conditions) {
                    continue;
                }
                if rule.is_cooling_down(now) {
                    tracing::debug!(rule = %rule.name, "rule cooling down");
                    continue;
                }
                rule.record_trigger(now);
                tracing::info!(
                    rule = %rule.name,
                    event = event_name,
                    actions = rule.actions.len(),
                    "rule triggered"
                );
                jobs.push(DispatchJob {
                    rule_id: rule.id,
                    rule_name: rule.name.clone(),
                    event_name: event_name.to_string(),
                    actions: rule.actions.clone(),
                });
            }
        }
        drop(guard);

        let mut outcome = EventOutcome::default();
        for job in jobs {
            outcome.fired.push(job.rule_id);
            outcome.dispatches.push(runtime.spawn(dispatcher::dispatch(
                job,
                links.clone(),
                Arc::clone(&self.variables),
                self.options.retry,
            )));
        }
        outcome
    }

    /// Check whether `rule` would fire for `payload`, without side effects.
    ///
    /// Cooldowns are not considered.
    #[must_use]
    pub fn test_rule(&self, rule: &AutomationRule, payload: &Map<String, Value>) -> RuleProbe {
        if !rule.enabled {
            return RuleProbe::new(false, "Rule is disabled");
        }
        if !rule.trigger.matches_payload(payload) {
            return RuleProbe::new(false, "Trigger data does not match");
        }
        let state = self.lock();
        let variables = self
            .variables
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let context = EvaluationContext {
            state: &state.live,
            payload,
            variables: &variables,
        };
        if context.all_hold(&rule.conditions) {
            RuleProbe::new(true, "All conditions met")
        } else {
            RuleProbe::new(false, "Conditions not met")
        }
    }

    /// Counters over the current rule snapshot.
    ///
    /// `total_triggers` is the sum of the rules' `trigger_count`.
    #[must_use]
    pub fn statistics(&self) -> EngineStatistics {
        let state = self.lock();
        EngineStatistics {
            total_rules: state.rules.len(),
            enabled_rules: state.rules.iter().filter(|rule| rule.enabled).count(),
            total_triggers: state.rules.iter().map(|rule| rule.trigger_count).sum(),
        }
    }

    /// The engine's copy of the rules, with up-to-date counters.
    #[must_use]
    pub fn rules(&self) -> Vec<AutomationRule> {
        self.lock().rules.clone()
    }

    /// Value of a variable set by a FileExists / FolderExists action.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<Value> {
        self.variables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn lock(&self) -> MutexGuard<'_, EngineState<T, B, N>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keep the counters the engine already accumulated for rules that survive a
/// snapshot swap.
fn carry_over(current: &[AutomationRule], incoming: Vec<AutomationRule>) -> Vec<AutomationRule> {
    let known: HashMap<RuleId, &AutomationRule> =
        current.iter().map(|rule| (rule.id, rule)).collect();
    incoming
        .into_iter()
        .map(|mut rule| {
            if let Some(previous) = known.get(&rule.id) {
                rule.trigger_count = rule.trigger_count.max(previous.trigger_count);
                rule.last_triggered = rule.last_triggered.max(previous.last_triggered);
            }
            rule
        })
        .collect()
}
