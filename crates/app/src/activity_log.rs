//! In-memory log of recent dispatch notifications.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use stagehand_domain::notification::{DispatchOutcome, Notification};

use crate::ports::Notifier;

/// [`Notifier`] that logs every notification and keeps the most recent ones.
pub struct ActivityLog {
    capacity: usize,
    entries: Mutex<VecDeque<Notification>>,
}

impl ActivityLog {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
        }
    }

    /// Most recent notifications, newest first.
    #[must_use]
    pub fn recent(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .cloned()
            .collect()
    }
}

impl Notifier for ActivityLog {
    fn notify(&self, notification: &Notification) {
        match notification.outcome {
            DispatchOutcome::Success => tracing::info!(%notification, "automation dispatched"),
            DispatchOutcome::Partial | DispatchOutcome::Failure => {
                tracing::warn!(%notification, "automation dispatched with failures");
            }
        }
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(notification.clone());
    }
}
