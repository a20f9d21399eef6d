//! # stagehand-app
//!
//! Application layer: use-cases, **port definitions** (traits) and the
//! automation engine.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `RuleRepository`: load/save of the ordered rule list
//!   - `ToolActionHandler`: executes production-tool actions
//!   - `BotClient`: runs named automation-bot actions
//!   - `Notifier`: receives one notification per dispatch
//!   - `LiveStateSource`: current production-tool state
//!   - `EventPublisher`: publishes incoming events
//! - Provide the **automation engine**: trigger matching, condition
//!   evaluation, cooldown gate and action dispatch
//! - Provide **services**: the in-memory `RuleStore` and `AutomationService`
//! - Provide **in-process infrastructure** (event bus, ingest pump, activity log)
//!
//! ## Dependency rule
//! Depends on `stagehand-domain` only (plus `tokio` for tasks and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod activity_log;
pub mod automation_engine;
pub mod event_bus;
pub mod ingest;
pub mod ports;
pub mod services;
