//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod activity;
#[allow(clippy::missing_errors_doc)]
pub mod events;
#[allow(clippy::missing_errors_doc)]
pub mod live_state;
#[allow(clippy::missing_errors_doc)]
pub mod rules;
#[allow(clippy::missing_errors_doc)]
pub mod templates;

use axum::Router;
use axum::routing::{get, post};

use stagehand_app::ports::{BotClient, Notifier, RuleRepository, ToolActionHandler};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<R, T, B, N>() -> Router<AppState<R, T, B, N>>
where
    R: RuleRepository + Send + Sync + 'static,
    T: ToolActionHandler + 'static,
    B: BotClient + 'static,
    N: Notifier + 'static,
{
    Router::new()
        // Rules
        .route(
            "/rules",
            get(rules::list::<R, T, B, N>).post(rules::create::<R, T, B, N>),
        )
        .route(
            "/rules/{id}",
            get(rules::get::<R, T, B, N>)
                .put(rules::update::<R, T, B, N>)
                .delete(rules::delete::<R, T, B, N>),
        )
        .route("/rules/{id}/toggle", post(rules::toggle::<R, T, B, N>))
        .route("/rules/{id}/test", post(rules::test::<R, T, B, N>))
        // Templates
        .route("/templates", get(templates::list))
        .route(
            "/templates/{index}",
            post(templates::instantiate::<R, T, B, N>),
        )
        // Ingest
        .route("/events", post(events::ingest::<R, T, B, N>))
        .route(
            "/state",
            get(live_state::get::<R, T, B, N>).put(live_state::replace::<R, T, B, N>),
        )
        // Activity
        .route("/statistics", get(activity::statistics::<R, T, B, N>))
        .route("/notifications", get(activity::notifications::<R, T, B, N>))
}
