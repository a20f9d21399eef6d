//! Event bus port: publish/subscribe for incoming events.

use std::future::Future;

use stagehand_domain::error::StagehandError;
use stagehand_domain::event::IncomingEvent;

/// Publishes events to interested subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(
        &self,
        event: IncomingEvent,
    ) -> impl Future<Output = Result<(), StagehandError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        event: IncomingEvent,
    ) -> impl Future<Output = Result<(), StagehandError>> + Send {
        (**self).publish(event)
    }
}
