//! Event ingest: forwards events from the bus into the engine.

use std::sync::Arc;

use tokio::sync::broadcast;

use stagehand_domain::event::IncomingEvent;

use crate::automation_engine::AutomationEngine;
use crate::ports::{BotClient, LiveStateSource, Notifier, ToolActionHandler};

/// Feed every event received on `events` to the engine until the bus closes.
///
/// The live state is refreshed from `source` before each event so conditions
/// see the state the event produced.
pub async fn pump<S, T, B, N>(
    mut events: broadcast::Receiver<IncomingEvent>,
    engine: Arc<AutomationEngine<T, B, N>>,
    source: S,
) where
    S: LiveStateSource,
    T: ToolActionHandler + 'static,
    B: BotClient + 'static,
    N: Notifier + 'static,
{
    loop {
        match events.recv().await {
            Ok(event) => {
                engine.update_live_state(source.snapshot());
                let outcome = engine.process_event(&event.name, &event.payload);
                if !outcome.fired.is_empty() {
                    tracing::debug!(event = %event.name, fired = outcome.fired.len(), "event ingested");
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event ingest lagging, events dropped");
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::info!("event bus closed, ingest stopped");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use serde_json::{Map, Value};
    use stagehand_domain::automation::{
        AutomationCondition, AutomationRule, AutomationTrigger, ConditionKind, Operator,
        ToolRequest,
    };
    use stagehand_domain::notification::Notification;
    use stagehand_domain::state::LiveState;

    use crate::automation_engine::EngineOptions;
    use crate::event_bus::InProcessEventBus;
    use crate::ports::{ClientError, EventPublisher, ToolOutcome};

    struct OkTool;

    impl ToolActionHandler for OkTool {
        async fn execute(&self, _request: ToolRequest) -> Result<ToolOutcome, ClientError> {
            Ok(ToolOutcome::ok("ok"))
        }
    }

    struct NoBot;

    impl BotClient for NoBot {
        async fn do_action(
            &self,
            _action_name: &str,
            _args: Map<String, Value>,
        ) -> Result<(), ClientError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Seen(Mutex<Vec<String>>);

    impl Notifier for Seen {
        fn notify(&self, notification: &Notification) {
            self.0.lock().unwrap().push(notification.rule_name.clone());
        }
    }

    struct Streaming;

    impl LiveStateSource for Streaming {
        fn snapshot(&self) -> LiveState {
            LiveState {
                stream_active: true,
                ..LiveState::default()
            }
        }
    }

    #[tokio::test]
    async fn should_refresh_live_state_and_process_bus_events() {
        let rule = AutomationRule::builder()
            .name("live only")
            .trigger(AutomationTrigger::new("SceneChanged"))
            .condition(AutomationCondition::new(
                ConditionKind::Stream,
                "streamActive",
                Operator::Equals,
                "true",
            ))
            .build()
            .unwrap();
        let engine: Arc<AutomationEngine<OkTool, NoBot, Seen>> =
            Arc::new(AutomationEngine::new(EngineOptions::default()));
        engine.initialize(vec![rule], None::<NoBot>, OkTool, Seen::default());

        let bus = InProcessEventBus::new(8);
        let task = tokio::spawn(pump(bus.subscribe(), Arc::clone(&engine), Streaming));

        bus.publish(IncomingEvent::named("SceneChanged"))
            .await
            .unwrap();
        drop(bus);
        task.await.unwrap();

        assert!(engine.live_state().stream_active);
        assert_eq!(engine.statistics().total_triggers, 1);
    }
}
