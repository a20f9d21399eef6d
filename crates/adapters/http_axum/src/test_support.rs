//! In-memory collaborators for handler tests.

use std::future::Future;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use serde_json::{Map, Value};

use stagehand_app::activity_log::ActivityLog;
use stagehand_app::automation_engine::{AutomationEngine, EngineOptions, RetryPolicy};
use stagehand_app::ports::{BotClient, ClientError, RuleRepository, ToolActionHandler, ToolOutcome};
use stagehand_app::services::automation_service::AutomationService;
use stagehand_domain::automation::{AutomationRule, ToolRequest};
use stagehand_domain::error::StagehandError;

use crate::state::AppState;

#[derive(Default)]
pub(crate) struct MemoryRepo(pub Mutex<Vec<AutomationRule>>);

impl RuleRepository for MemoryRepo {
    fn load(&self) -> impl Future<Output = Result<Vec<AutomationRule>, StagehandError>> + Send {
        let rules = self.0.lock().unwrap().clone();
        async { Ok(rules) }
    }

    fn save(
        &self,
        rules: Vec<AutomationRule>,
    ) -> impl Future<Output = Result<(), StagehandError>> + Send {
        *self.0.lock().unwrap() = rules;
        async { Ok(()) }
    }
}

pub(crate) struct OkTool;

impl ToolActionHandler for OkTool {
    async fn execute(&self, request: ToolRequest) -> Result<ToolOutcome, ClientError> {
        Ok(ToolOutcome::ok(request.to_string()))
    }
}

pub(crate) struct NoBot;

impl BotClient for NoBot {
    async fn do_action(
        &self,
        _action_name: &str,
        _args: Map<String, Value>,
    ) -> Result<(), ClientError> {
        Ok(())
    }
}

pub(crate) type TestState = AppState<MemoryRepo, OkTool, NoBot, Arc<ActivityLog>>;

pub(crate) fn test_state() -> TestState {
    let activity = Arc::new(ActivityLog::new(10));
    let engine = Arc::new(AutomationEngine::new(EngineOptions {
        retry: RetryPolicy::none(),
    }));
    engine.initialize(Vec::new(), None, OkTool, Arc::clone(&activity));
    AppState::new(
        Arc::new(AutomationService::new(MemoryRepo::default())),
        engine,
        activity,
    )
}

pub(crate) fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub(crate) fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub(crate) async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
