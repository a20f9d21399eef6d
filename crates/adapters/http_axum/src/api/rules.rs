//! JSON REST handlers for automation rules.
//!
//! Every mutation takes over the engine's counters first, goes through the
//! service (which saves the snapshot) and then hands the new rule list to
//! the engine.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Map, Value};

use stagehand_app::automation_engine::RuleProbe;
use stagehand_app::ports::{BotClient, Notifier, RuleRepository, ToolActionHandler};
use stagehand_domain::automation::{
    AutomationAction, AutomationCondition, AutomationRule, AutomationTrigger, RulePatch,
};
use stagehand_domain::id::RuleId;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating a rule.
#[derive(Deserialize)]
pub struct CreateRuleRequest {
    pub id: Option<RuleId>,
    pub name: String,
    pub enabled: Option<bool>,
    pub trigger: AutomationTrigger,
    #[serde(default)]
    pub conditions: Vec<AutomationCondition>,
    #[serde(default)]
    pub actions: Vec<AutomationAction>,
    #[serde(default)]
    pub cooldown: u64,
}

/// Request body for a dry run.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TestRuleRequest {
    pub payload: Map<String, Value>,
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<AutomationRule>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/rules`: list all rules in evaluation order.
pub async fn list<R, T, B, N>(
    State(state): State<AppState<R, T, B, N>>,
) -> Json<Vec<AutomationRule>>
where
    R: RuleRepository + Send + Sync + 'static,
    T: ToolActionHandler + 'static,
    B: BotClient + 'static,
    N: Notifier + 'static,
{
    state.absorb_engine_counters();
    Json(state.automation_service.rules())
}

/// `GET /api/rules/{id}`
pub async fn get<R, T, B, N>(
    State(state): State<AppState<R, T, B, N>>,
    Path(id): Path<String>,
) -> Result<Json<AutomationRule>, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    T: ToolActionHandler + 'static,
    B: BotClient + 'static,
    N: Notifier + 'static,
{
    let rule_id = RuleId::parse_external(&id)?;
    state.absorb_engine_counters();
    Ok(Json(state.automation_service.get_rule(rule_id)?))
}

/// `POST /api/rules`: add a rule at the end of the list.
pub async fn create<R, T, B, N>(
    State(state): State<AppState<R, T, B, N>>,
    Json(req): Json<CreateRuleRequest>,
) -> Result<CreateResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    T: ToolActionHandler + 'static,
    B: BotClient + 'static,
    N: Notifier + 'static,
{
    let mut builder = AutomationRule::builder()
        .name(req.name)
        .trigger(req.trigger)
        .conditions(req.conditions)
        .actions(req.actions)
        .cooldown(req.cooldown);
    if let Some(id) = req.id {
        builder = builder.id(id);
    }
    if let Some(enabled) = req.enabled {
        builder = builder.enabled(enabled);
    }
    let rule = builder.build()?;

    state.absorb_engine_counters();
    let created = state.automation_service.create_rule(rule).await?;
    state.refresh_engine();
    Ok(CreateResponse::Created(Json(created)))
}

/// `PUT /api/rules/{id}`: apply a partial edit.
pub async fn update<R, T, B, N>(
    State(state): State<AppState<R, T, B, N>>,
    Path(id): Path<String>,
    Json(patch): Json<RulePatch>,
) -> Result<Json<AutomationRule>, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    T: ToolActionHandler + 'static,
    B: BotClient + 'static,
    N: Notifier + 'static,
{
    let rule_id = RuleId::parse_external(&id)?;
    state.absorb_engine_counters();
    let updated = state.automation_service.update_rule(rule_id, patch).await?;
    state.refresh_engine();
    Ok(Json(updated))
}

/// `DELETE /api/rules/{id}`
pub async fn delete<R, T, B, N>(
    State(state): State<AppState<R, T, B, N>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    T: ToolActionHandler + 'static,
    B: BotClient + 'static,
    N: Notifier + 'static,
{
    let rule_id = RuleId::parse_external(&id)?;
    state.absorb_engine_counters();
    state.automation_service.delete_rule(rule_id).await?;
    state.refresh_engine();
    Ok(DeleteResponse::NoContent)
}

/// `POST /api/rules/{id}/toggle`: flip the enabled flag.
pub async fn toggle<R, T, B, N>(
    State(state): State<AppState<R, T, B, N>>,
    Path(id): Path<String>,
) -> Result<Json<AutomationRule>, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    T: ToolActionHandler + 'static,
    B: BotClient + 'static,
    N: Notifier + 'static,
{
    let rule_id = RuleId::parse_external(&id)?;
    state.absorb_engine_counters();
    let toggled = state.automation_service.toggle_rule(rule_id).await?;
    state.refresh_engine();
    Ok(Json(toggled))
}

/// `POST /api/rules/{id}/test`: dry run against a sample payload.
pub async fn test<R, T, B, N>(
    State(state): State<AppState<R, T, B, N>>,
    Path(id): Path<String>,
    Json(req): Json<TestRuleRequest>,
) -> Result<Json<RuleProbe>, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    T: ToolActionHandler + 'static,
    B: BotClient + 'static,
    N: Notifier + 'static,
{
    let rule_id = RuleId::parse_external(&id)?;
    let rule = state.automation_service.get_rule(rule_id)?;
    Ok(Json(state.engine.test_rule(&rule, &req.payload)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::router::build;
    use crate::test_support::{body_json, empty_request, json_request, test_state};

    fn stream_rule() -> Value {
        json!({
            "name": "Go live",
            "trigger": {
                "event_name": "StreamStateChanged",
                "event_data": {"outputState": "OBS_WEBSOCKET_OUTPUT_STARTED"}
            },
            "actions": [
                {"target": {"type": "tool", "data": {"type": "startRecord"}}}
            ]
        })
    }

    #[tokio::test]
    async fn should_create_rule_and_hand_it_to_engine() {
        let state = test_state();
        let app = build(state.clone());

        let response = app
            .oneshot(json_request("POST", "/api/rules", &stream_rule()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["name"], "Go live");
        assert_eq!(body["enabled"], true);
        assert_eq!(state.engine.rules().len(), 1);
        assert_eq!(state.automation_service.rules().len(), 1);
    }

    #[tokio::test]
    async fn should_reject_rule_with_blank_name() {
        let mut rule = stream_rule();
        rule["name"] = json!("  ");

        let response = build(test_state())
            .oneshot(json_request("POST", "/api/rules", &rule))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "name must not be empty");
    }

    #[tokio::test]
    async fn should_return_conflict_when_id_is_taken() {
        let state = test_state();
        let mut rule = stream_rule();
        rule["id"] = json!("6f1c1f3e-2b7d-4c55-9d2c-0e8f6b1a2c3d");

        let first = build(state.clone())
            .oneshot(json_request("POST", "/api/rules", &rule))
            .await
            .unwrap();
        let second = build(state)
            .oneshot(json_request("POST", "/api/rules", &rule))
            .await
            .unwrap();

        assert_eq!(first.status(), StatusCode::CREATED);
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn should_return_400_for_malformed_id() {
        let response = build(test_state())
            .oneshot(empty_request("GET", "/api/rules/not-a-uuid"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_return_404_for_unknown_rule() {
        let response = build(test_state())
            .oneshot(empty_request("DELETE", "/api/rules/6f1c1f3e-2b7d-4c55-9d2c-0e8f6b1a2c3d"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_patch_and_toggle_rule() {
        let state = test_state();
        let created = body_json(
            build(state.clone())
                .oneshot(json_request("POST", "/api/rules", &stream_rule()))
                .await
                .unwrap(),
        )
        .await;
        let id = created["id"].as_str().unwrap().to_string();

        let patched = build(state.clone())
            .oneshot(json_request("PUT", &format!("/api/rules/{id}"), &json!({"cooldown": 30})))
            .await
            .unwrap();
        assert_eq!(patched.status(), StatusCode::OK);
        assert_eq!(body_json(patched).await["cooldown"], 30);

        let toggled = build(state.clone())
            .oneshot(empty_request("POST", &format!("/api/rules/{id}/toggle")))
            .await
            .unwrap();
        assert_eq!(body_json(toggled).await["enabled"], false);
        assert!(!state.engine.rules()[0].enabled);
    }

    #[tokio::test]
    async fn should_delete_rule_from_store_and_engine() {
        let state = test_state();
        let created = body_json(
            build(state.clone())
                .oneshot(json_request("POST", "/api/rules", &stream_rule()))
                .await
                .unwrap(),
        )
        .await;
        let id = created["id"].as_str().unwrap().to_string();

        let response = build(state.clone())
            .oneshot(empty_request("DELETE", &format!("/api/rules/{id}")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.engine.rules().is_empty());
        assert!(state.automation_service.rules().is_empty());
    }

    #[tokio::test]
    async fn should_explain_dry_run_result() {
        let state = test_state();
        let created = body_json(
            build(state.clone())
                .oneshot(json_request("POST", "/api/rules", &stream_rule()))
                .await
                .unwrap(),
        )
        .await;
        let id = created["id"].as_str().unwrap().to_string();
        let uri = format!("/api/rules/{id}/test");

        let matching = body_json(
            build(state.clone())
                .oneshot(json_request(
                    "POST",
                    &uri,
                    &json!({"payload": {"outputState": "OBS_WEBSOCKET_OUTPUT_STARTED"}}),
                ))
                .await
                .unwrap(),
        )
        .await;
        let other = body_json(
            build(state)
                .oneshot(json_request("POST", &uri, &json!({"payload": {}})))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(matching["would_trigger"], true);
        assert_eq!(matching["reason"], "All conditions met");
        assert_eq!(other["would_trigger"], false);
        assert_eq!(other["reason"], "Trigger data does not match");
    }
}
