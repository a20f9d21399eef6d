//! Event ingest endpoint for the production-tool connection.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use stagehand_app::ports::{BotClient, Notifier, RuleRepository, ToolActionHandler};
use stagehand_domain::error::ValidationError;
use stagehand_domain::event::IncomingEvent;
use stagehand_domain::id::RuleId;

use crate::error::ApiError;
use crate::state::AppState;

/// Rules that fired for the posted event. Their actions run in the background.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub fired: Vec<RuleId>,
}

/// `POST /api/events`: hand one event to the engine.
pub async fn ingest<R, T, B, N>(
    State(state): State<AppState<R, T, B, N>>,
    Json(event): Json<IncomingEvent>,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    T: ToolActionHandler + 'static,
    B: BotClient + 'static,
    N: Notifier + 'static,
{
    if event.name.trim().is_empty() {
        return Err(ValidationError::EmptyEventName.into());
    }
    let outcome = state.engine.process_event(&event.name, &event.payload);
    Ok((
        StatusCode::ACCEPTED,
        Json(IngestResponse {
            fired: outcome.fired,
        }),
    ))
}
