//! Virtual automation bot.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};
use stagehand_app::ports::{BotClient, ClientError};

/// One recorded `do_action` call.
#[derive(Debug, Clone, PartialEq)]
pub struct BotCall {
    pub action_name: String,
    pub args: Map<String, Value>,
}

/// A bot that accepts every action except the ones marked as failing.
#[derive(Default)]
pub struct VirtualBot {
    calls: Mutex<Vec<BotCall>>,
    failing: Mutex<HashSet<String>>,
}

impl VirtualBot {
    /// Make every future call to `action_name` fail.
    pub fn fail_action(&self, action_name: impl Into<String>) {
        lock(&self.failing).insert(action_name.into());
    }

    /// Calls received so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<BotCall> {
        lock(&self.calls).clone()
    }
}

impl BotClient for VirtualBot {
    fn do_action(
        &self,
        action_name: &str,
        args: Map<String, Value>,
    ) -> impl Future<Output = Result<(), ClientError>> + Send {
        lock(&self.calls).push(BotCall {
            action_name: action_name.to_string(),
            args,
        });
        let result = if lock(&self.failing).contains(action_name) {
            Err(ClientError::Rejected(format!("action \"{action_name}\" failed")))
        } else {
            tracing::debug!(action = action_name, "virtual bot action");
            Ok(())
        };
        async { result }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
