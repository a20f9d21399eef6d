//! Action dispatch: runs a fired rule's actions and reports the outcome.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::{Map, Value};
use stagehand_domain::automation::{
    ActionTarget, AutomationAction, BotAction, DEFAULT_FILE_VARIABLE, DEFAULT_FOLDER_VARIABLE,
};
use stagehand_domain::id::RuleId;
use stagehand_domain::notification::{ActionReport, ActionResult, DispatchOutcome, Notification};
use stagehand_domain::time;

use crate::ports::{BotClient, ClientError, Notifier, ToolActionHandler};

/// How many times an action is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// Build a policy; at least one attempt is always made.
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// A single attempt, no retry.
    #[must_use]
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

/// Collaborators captured by a dispatch at the moment its rule fired.
pub(crate) struct Links<T, B, N> {
    pub tool: Arc<T>,
    pub bot: Option<Arc<B>>,
    pub notifier: Arc<N>,
}

impl<T, B, N> Clone for Links<T, B, N> {
    fn clone(&self) -> Self {
        Self {
            tool: Arc::clone(&self.tool),
            bot: self.bot.clone(),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

/// The part of a fired rule a dispatch needs.
pub(crate) struct DispatchJob {
    pub rule_id: RuleId,
    pub rule_name: String,
    pub event_name: String,
    pub actions: Vec<AutomationAction>,
}

/// Run every action in order, then emit one aggregated notification.
///
/// A failed action never stops the following ones.
pub(crate) async fn dispatch<T, B, N>(
    job: DispatchJob,
    links: Links<T, B, N>,
    variables: Arc<Mutex<Map<String, Value>>>,
    retry: RetryPolicy,
) -> Notification
where
    T: ToolActionHandler,
    B: BotClient,
    N: Notifier,
{
    let started_at = time::now();
    let mut reports = Vec::with_capacity(job.actions.len());

    for (index, action) in job.actions.iter().enumerate() {
        let result = attempt(action, &links, &variables, retry).await;
        if let ActionResult::Failed { error, attempts } = &result {
            tracing::warn!(
                rule = %job.rule_name,
                position = index + 1,
                attempts,
                error = %error,
                "action failed"
            );
        }
        reports.push(ActionReport {
            action_id: action.id,
            position: index + 1,
            summary: action.to_string(),
            result,
        });
    }

    let failed = reports.iter().filter(|r| r.result.is_failure()).count();
    let notification = Notification {
        rule_id: job.rule_id,
        rule_name: job.rule_name,
        event_name: job.event_name,
        outcome: DispatchOutcome::from_counts(failed, reports.len()),
        actions: reports,
        started_at,
        finished_at: time::now(),
    };
    links.notifier.notify(&notification);
    notification
}

async fn attempt<T, B, N>(
    action: &AutomationAction,
    links: &Links<T, B, N>,
    variables: &Mutex<Map<String, Value>>,
    retry: RetryPolicy,
) -> ActionResult
where
    T: ToolActionHandler,
    B: BotClient,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        match perform(action, links, variables).await {
            Ok(message) => return ActionResult::Succeeded { message, attempts },
            Err(err) if attempts >= retry.max_attempts => {
                return ActionResult::Failed {
                    error: err.to_string(),
                    attempts,
                };
            }
            Err(err) => {
                tracing::debug!(%action, attempts, error = %err, "retrying action");
                tokio::time::sleep(retry.delay).await;
            }
        }
    }
}

async fn perform<T, B, N>(
    action: &AutomationAction,
    links: &Links<T, B, N>,
    variables: &Mutex<Map<String, Value>>,
) -> Result<String, ClientError>
where
    T: ToolActionHandler,
    B: BotClient,
{
    match &action.target {
        ActionTarget::Tool(request) => {
            let outcome = links.tool.execute(request.clone()).await?;
            if outcome.success {
                Ok(outcome.message)
            } else {
                Err(ClientError::Rejected(outcome.error.unwrap_or(outcome.message)))
            }
        }
        ActionTarget::Bot(BotAction::DoAction { action_name, args }) => {
            let bot = links
                .bot
                .as_ref()
                .ok_or_else(|| ClientError::Unavailable("automation bot".to_string()))?;
            bot.do_action(action_name, args.clone()).await?;
            Ok(format!("executed bot action \"{action_name}\""))
        }
        ActionTarget::Bot(BotAction::FileExists {
            path,
            variable_name,
        }) => {
            let exists = path_exists(path, |meta| meta.is_file()).await?;
            let name = variable_name.as_deref().unwrap_or(DEFAULT_FILE_VARIABLE);
            store(variables, name, exists);
            Ok(format!("{name} = {exists}"))
        }
        ActionTarget::Bot(BotAction::FolderExists {
            path,
            variable_name,
        }) => {
            let exists = path_exists(path, |meta| meta.is_dir()).await?;
            let name = variable_name.as_deref().unwrap_or(DEFAULT_FOLDER_VARIABLE);
            store(variables, name, exists);
            Ok(format!("{name} = {exists}"))
        }
    }
}

async fn path_exists(
    path: &str,
    kind: impl FnOnce(&std::fs::Metadata) -> bool,
) -> Result<bool, ClientError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(kind(&meta)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(ClientError::Io(err.to_string())),
    }
}

fn store(variables: &Mutex<Map<String, Value>>, name: &str, value: bool) {
    variables
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(name.to_string(), Value::Bool(value));
}
