//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`StagehandError`] via `From` at the port boundary.

use crate::id::RuleId;

/// Top-level error returned by domain validation and application ports.
#[derive(Debug, thiserror::Error)]
pub enum StagehandError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The requested item does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// A persistence adapter failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("trigger event name must not be empty")]
    EmptyEventName,

    #[error("condition field must not be empty")]
    EmptyConditionField,

    #[error("bot action name must not be empty")]
    EmptyBotActionName,

    #[error("path must not be empty")]
    EmptyPath,

    #[error("tool action batch must not be empty")]
    EmptyBatch,

    #[error("rule {0} already exists")]
    DuplicateRule(RuleId),

    #[error("invalid identifier {0:?}")]
    InvalidId(String),
}

/// Lookup failure for a named kind of item.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
