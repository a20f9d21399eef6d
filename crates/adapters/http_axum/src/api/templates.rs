//! Built-in rule templates.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use stagehand_app::ports::{BotClient, Notifier, RuleRepository, ToolActionHandler};
use stagehand_domain::automation::AutomationRule;
use stagehand_domain::error::{NotFoundError, StagehandError};
use stagehand_domain::template::RuleTemplate;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/templates`
pub async fn list() -> Json<Vec<RuleTemplate>> {
    Json(RuleTemplate::builtin())
}

/// `POST /api/templates/{index}`: create a rule from the template at `index`.
pub async fn instantiate<R, T, B, N>(
    State(state): State<AppState<R, T, B, N>>,
    Path(index): Path<usize>,
) -> Result<(StatusCode, Json<AutomationRule>), ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    T: ToolActionHandler + 'static,
    B: BotClient + 'static,
    N: Notifier + 'static,
{
    let template = RuleTemplate::builtin()
        .into_iter()
        .nth(index)
        .ok_or_else(|| {
            StagehandError::NotFound(NotFoundError {
                entity: "Template",
                id: index.to_string(),
            })
        })?;
    let rule = template.instantiate()?;

    state.absorb_engine_counters();
    let created = state.automation_service.create_rule(rule).await?;
    state.refresh_engine();
    Ok((StatusCode::CREATED, Json(created)))
}
