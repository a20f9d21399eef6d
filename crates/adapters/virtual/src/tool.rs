//! Virtual production tool.
//!
//! Applies actions to an in-memory [`Studio`] and publishes the resulting
//! state-change events, the same way a connected tool would report them.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use stagehand_app::ports::{
    ClientError, EventPublisher, LiveStateSource, ToolActionHandler, ToolOutcome,
};
use stagehand_domain::automation::ToolRequest;
use stagehand_domain::error::StagehandError;
use stagehand_domain::event::IncomingEvent;
use stagehand_domain::state::LiveState;

use crate::studio::Studio;

/// Simulated production tool feeding its events into `P`.
pub struct VirtualProductionTool<P> {
    studio: Mutex<Studio>,
    publisher: P,
}

impl<P> VirtualProductionTool<P> {
    /// Start from the demo scene collection, on the "Intro" scene.
    pub fn new(publisher: P) -> Self {
        Self {
            studio: Mutex::new(Studio::demo()),
            publisher,
        }
    }

    /// Set an extra value exposed through the live state.
    pub fn set_value(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.studio().set_value(key.into(), value.into());
    }

    #[must_use]
    pub fn program_scene(&self) -> String {
        self.studio().program_scene().to_string()
    }

    /// Visibility of `source` in `scene`, `None` when either is unknown.
    #[must_use]
    pub fn source_enabled(&self, scene: &str, source: &str) -> Option<bool> {
        self.studio().source_enabled(scene, source)
    }

    #[must_use]
    pub fn input_muted(&self, input: &str) -> Option<bool> {
        self.studio().input(input).map(|i| i.muted)
    }

    #[must_use]
    pub fn input_volume(&self, input: &str) -> Option<f64> {
        self.studio().input(input).map(|i| i.volume_mul)
    }

    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.studio().is_streaming()
    }

    fn studio(&self) -> MutexGuard<'_, Studio> {
        self.studio.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply the request as a whole.
    ///
    /// The actions run against a draft of the studio which replaces the live
    /// one only when every action went through. A refused batch changes
    /// nothing and emits nothing, so the dispatcher can safely send it again.
    fn apply(&self, request: &ToolRequest) -> (ToolOutcome, Vec<IncomingEvent>) {
        let mut studio = self.studio();
        let mut draft = studio.clone();
        let mut messages = Vec::new();
        let mut events = Vec::new();

        for action in request.actions() {
            match draft.apply(action) {
                Ok(applied) => {
                    messages.push(applied.message);
                    events.extend(applied.events);
                }
                Err(error) => {
                    tracing::debug!(%action, %error, "virtual tool refused action");
                    let outcome = ToolOutcome::failed(format!("{action} failed"), error);
                    return (outcome, Vec::new());
                }
            }
        }
        *studio = draft;
        (ToolOutcome::ok(messages.join("; ")), events)
    }
}

impl<P: EventPublisher> VirtualProductionTool<P> {
    /// Publish an event as if the tool had reported it on its own.
    ///
    /// # Errors
    ///
    /// Returns the publisher's error.
    pub async fn emit(&self, event: IncomingEvent) -> Result<(), StagehandError> {
        self.publisher.publish(event).await
    }
}

impl<P: EventPublisher + Send + Sync> ToolActionHandler for VirtualProductionTool<P> {
    fn execute(
        &self,
        request: ToolRequest,
    ) -> impl Future<Output = Result<ToolOutcome, ClientError>> + Send {
        let (outcome, events) = self.apply(&request);
        async move {
            for event in events {
                self.publisher
                    .publish(event)
                    .await
                    .map_err(|err| ClientError::Transport(err.to_string()))?;
            }
            Ok(outcome)
        }
    }
}

impl<P: Send + Sync> LiveStateSource for VirtualProductionTool<P> {
    fn snapshot(&self) -> LiveState {
        self.studio().live_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_domain::automation::ToolAction;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<IncomingEvent>>);

    impl Recorder {
        fn names(&self) -> Vec<String> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .map(|e| e.name.clone())
                .collect()
        }
    }

    impl EventPublisher for Recorder {
        fn publish(
            &self,
            event: IncomingEvent,
        ) -> impl Future<Output = Result<(), StagehandError>> + Send {
            self.0.lock().unwrap().push(event);
            async { Ok(()) }
        }
    }

    struct Broken;

    impl EventPublisher for Broken {
        async fn publish(&self, _event: IncomingEvent) -> Result<(), StagehandError> {
            Err(StagehandError::Storage("bus closed".into()))
        }
    }

    fn scene(name: &str) -> ToolAction {
        ToolAction::SetCurrentProgramScene {
            scene_name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn should_apply_action_and_publish_event() {
        let tool = VirtualProductionTool::new(Recorder::default());

        let outcome = tool.execute(scene("Gaming").into()).await.unwrap();

        assert!(outcome.success);
        assert_eq!(tool.program_scene(), "Gaming");
        assert_eq!(tool.publisher.names(), vec!["CurrentProgramSceneChanged"]);
    }

    #[tokio::test]
    async fn should_report_refusal_as_failed_outcome() {
        let tool = VirtualProductionTool::new(Recorder::default());

        let outcome = tool.execute(scene("Nowhere").into()).await.unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("no scene named \"Nowhere\""));
        assert!(tool.publisher.names().is_empty());
    }

    #[tokio::test]
    async fn should_leave_studio_untouched_when_batch_is_refused() {
        let tool = VirtualProductionTool::new(Recorder::default());
        let batch = vec![
            ToolAction::StartStream,
            ToolAction::StartStream,
            ToolAction::StartRecord,
        ];

        let outcome = tool.execute(batch.into()).await.unwrap();

        assert!(!outcome.success);
        assert!(!tool.is_streaming());
        assert!(!tool.snapshot().record_active);
        assert!(tool.publisher.names().is_empty());
    }

    #[tokio::test]
    async fn should_give_same_result_when_refused_batch_is_sent_again() {
        let tool = VirtualProductionTool::new(Recorder::default());
        let batch: ToolRequest = vec![
            ToolAction::ToggleInputMute {
                input_name: "Mic/Aux".to_string(),
            },
            ToolAction::SetCurrentProgramScene {
                scene_name: "Nowhere".to_string(),
            },
        ]
        .into();

        for _ in 0..3 {
            let outcome = tool.execute(batch.clone()).await.unwrap();
            assert!(!outcome.success);
        }

        assert_eq!(tool.input_muted("Mic/Aux"), Some(false));
    }

    #[tokio::test]
    async fn should_map_publish_failure_to_transport_error() {
        let tool = VirtualProductionTool::new(Broken);

        let result = tool.execute(ToolAction::StartStream.into()).await;

        assert!(matches!(result, Err(ClientError::Transport(_))));
    }

    #[tokio::test]
    async fn should_expose_extra_values_in_snapshot() {
        let tool = VirtualProductionTool::new(Recorder::default());
        tool.set_value("viewerCount", 42);

        let state = tool.snapshot();

        assert_eq!(state.values["viewerCount"], 42);
        assert_eq!(state.current_program_scene.as_deref(), Some("Intro"));
    }

    #[tokio::test]
    async fn should_publish_emitted_events_untouched() {
        let tool = VirtualProductionTool::new(Recorder::default());

        tool.emit(IncomingEvent::named("ChatMessage").with("user", "alice"))
            .await
            .unwrap();

        assert_eq!(tool.publisher.names(), vec!["ChatMessage"]);
    }

    #[tokio::test]
    async fn should_track_mute_and_volume_per_input() {
        let tool = VirtualProductionTool::new(Recorder::default());
        let batch = vec![
            ToolAction::SetInputMute {
                input_name: "Mic/Aux".to_string(),
                input_muted: true,
            },
            ToolAction::SetInputVolume {
                input_name: "Desktop Audio".to_string(),
                input_volume_mul: Some(0.5),
                input_volume_db: None,
            },
        ];

        tool.execute(batch.into()).await.unwrap();

        assert_eq!(tool.input_muted("Mic/Aux"), Some(true));
        assert_eq!(tool.input_volume("Desktop Audio"), Some(0.5));
        assert_eq!(tool.input_muted("Nope"), None);
    }
}
