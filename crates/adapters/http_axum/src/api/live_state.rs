//! Live production-tool state.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use stagehand_app::ports::{BotClient, Notifier, RuleRepository, ToolActionHandler};
use stagehand_domain::state::LiveState;

use crate::state::AppState;

/// `GET /api/state`
pub async fn get<R, T, B, N>(State(state): State<AppState<R, T, B, N>>) -> Json<LiveState>
where
    R: RuleRepository + Send + Sync + 'static,
    T: ToolActionHandler + 'static,
    B: BotClient + 'static,
    N: Notifier + 'static,
{
    Json(state.engine.live_state())
}

/// `PUT /api/state`: replace the snapshot conditions are evaluated against.
pub async fn replace<R, T, B, N>(
    State(state): State<AppState<R, T, B, N>>,
    Json(live): Json<LiveState>,
) -> StatusCode
where
    R: RuleRepository + Send + Sync + 'static,
    T: ToolActionHandler + 'static,
    B: BotClient + 'static,
    N: Notifier + 'static,
{
    state.engine.update_live_state(live);
    StatusCode::NO_CONTENT
}
