//! Client ports: the production tool and the automation bot.
//!
//! Both are remote systems reached over a network connection owned by an
//! adapter. The engine only sees these traits.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use stagehand_domain::automation::ToolRequest;

/// Failure reported by a remote client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// No connection to the named system.
    #[error("{0} unavailable")]
    Unavailable(String),

    /// The remote system refused or failed the request.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The request could not be delivered.
    #[error("transport error: {0}")]
    Transport(String),

    /// A local filesystem check failed for a reason other than absence.
    #[error("io error: {0}")]
    Io(String),
}

/// Result returned by the production tool for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolOutcome {
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: Some(error.into()),
        }
    }
}

/// Executes production-tool actions (a single action or a batch).
pub trait ToolActionHandler: Send + Sync {
    /// Execute the request and report how it went.
    ///
    /// A delivered request that the tool could not apply is reported as
    /// `Ok(ToolOutcome { success: false, .. })`; `Err` is reserved for
    /// requests that never reached the tool.
    fn execute(
        &self,
        request: ToolRequest,
    ) -> impl Future<Output = Result<ToolOutcome, ClientError>> + Send;
}

impl<T: ToolActionHandler> ToolActionHandler for std::sync::Arc<T> {
    fn execute(
        &self,
        request: ToolRequest,
    ) -> impl Future<Output = Result<ToolOutcome, ClientError>> + Send {
        (**self).execute(request)
    }
}

/// Runs named actions on the automation bot.
pub trait BotClient: Send + Sync {
    fn do_action(
        &self,
        action_name: &str,
        args: Map<String, Value>,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}

impl<T: BotClient> BotClient for std::sync::Arc<T> {
    fn do_action(
        &self,
        action_name: &str,
        args: Map<String, Value>,
    ) -> impl Future<Output = Result<(), ClientError>> + Send {
        (**self).do_action(action_name, args)
    }
}

/// Client used when a system has no connection configured.
///
/// Every request fails with [`ClientError::Unavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Disconnected;

impl ToolActionHandler for Disconnected {
    async fn execute(&self, _request: ToolRequest) -> Result<ToolOutcome, ClientError> {
        Err(ClientError::Unavailable("production tool".to_string()))
    }
}

impl BotClient for Disconnected {
    async fn do_action(
        &self,
        _action_name: &str,
        _args: Map<String, Value>,
    ) -> Result<(), ClientError> {
        Err(ClientError::Unavailable("automation bot".to_string()))
    }
}
