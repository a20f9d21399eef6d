//! Shared application state for axum handlers.

use std::sync::Arc;

use stagehand_app::activity_log::ActivityLog;
use stagehand_app::automation_engine::AutomationEngine;
use stagehand_app::ports::{BotClient, Notifier, RuleRepository, ToolActionHandler};
use stagehand_app::services::automation_service::AutomationService;

/// Application state shared across all axum handlers.
///
/// Generic over the rule repository and the engine's collaborators to avoid
/// dynamic dispatch. `Clone` is implemented manually so only the `Arc`
/// wrappers are cloned.
pub struct AppState<R, T, B, N> {
    /// Rule CRUD backed by the store and the repository.
    pub automation_service: Arc<AutomationService<R>>,
    /// The engine fed by `/api/events`.
    pub engine: Arc<AutomationEngine<T, B, N>>,
    /// Recent dispatch notifications.
    pub activity: Arc<ActivityLog>,
}

impl<R, T, B, N> Clone for AppState<R, T, B, N> {
    fn clone(&self) -> Self {
        Self {
            automation_service: Arc::clone(&self.automation_service),
            engine: Arc::clone(&self.engine),
            activity: Arc::clone(&self.activity),
        }
    }
}

impl<R, T, B, N> AppState<R, T, B, N>
where
    R: RuleRepository + Send + Sync + 'static,
    T: ToolActionHandler + 'static,
    B: BotClient + 'static,
    N: Notifier + 'static,
{
    /// Create the state from components already shared with background tasks.
    pub fn new(
        automation_service: Arc<AutomationService<R>>,
        engine: Arc<AutomationEngine<T, B, N>>,
        activity: Arc<ActivityLog>,
    ) -> Self {
        Self {
            automation_service,
            engine,
            activity,
        }
    }

    /// Copy the counters the engine accumulated into the store, so a save
    /// does not roll them back.
    pub(crate) fn absorb_engine_counters(&self) {
        self.automation_service
            .absorb_counters(&self.engine.rules());
    }

    /// Hand the store's current rules to the engine.
    pub(crate) fn refresh_engine(&self) {
        self.engine.update_rules(self.automation_service.rules());
    }
}
