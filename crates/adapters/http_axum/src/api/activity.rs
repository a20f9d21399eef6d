//! Engine statistics and recent dispatch notifications.

use axum::Json;
use axum::extract::State;

use stagehand_app::ports::{BotClient, Notifier, RuleRepository, ToolActionHandler};
use stagehand_domain::notification::Notification;
use stagehand_domain::statistics::EngineStatistics;

use crate::state::AppState;

/// `GET /api/statistics`
pub async fn statistics<R, T, B, N>(
    State(state): State<AppState<R, T, B, N>>,
) -> Json<EngineStatistics>
where
    R: RuleRepository + Send + Sync + 'static,
    T: ToolActionHandler + 'static,
    B: BotClient + 'static,
    N: Notifier + 'static,
{
    Json(state.engine.statistics())
}

/// `GET /api/notifications`: newest first.
pub async fn notifications<R, T, B, N>(
    State(state): State<AppState<R, T, B, N>>,
) -> Json<Vec<Notification>>
where
    R: RuleRepository + Send + Sync + 'static,
    T: ToolActionHandler + 'static,
    B: BotClient + 'static,
    N: Notifier + 'static,
{
    Json(state.activity.recent())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tower::ServiceExt;

    use crate::router::build;
    use crate::test_support::{body_json, empty_request, json_request, test_state};

    #[tokio::test]
    async fn should_count_triggers_and_list_notifications() {
        let state = test_state();
        let rule = json!({
            "name": "Record on mute",
            "trigger": {"event_name": "InputMuteStateChanged", "event_data": {"inputMuted": true}},
            "actions": [{"target": {"type": "tool", "data": {"type": "startRecord"}}}]
        });
        build(state.clone())
            .oneshot(json_request("POST", "/api/rules", &rule))
            .await
            .unwrap();

        let payload = json!({"inputMuted": true});
        let outcome = state
            .engine
            .process_event("InputMuteStateChanged", payload.as_object().unwrap());
        outcome.join().await;

        let stats = body_json(
            build(state.clone())
                .oneshot(empty_request("GET", "/api/statistics"))
                .await
                .unwrap(),
        )
        .await;
        let expected = json!({"total_rules": 1, "enabled_rules": 1, "total_triggers": 1});
        assert_eq!(stats, expected);

        let notifications = body_json(
            build(state)
                .oneshot(empty_request("GET", "/api/notifications"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(notifications[0]["rule_name"], "Record on mute");
        assert_eq!(notifications[0]["outcome"], "success");
    }
}
