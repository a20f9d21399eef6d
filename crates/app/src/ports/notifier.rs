//! Notifier port: side channel for dispatch reports.

use stagehand_domain::notification::Notification;

/// Receives one [`Notification`] per rule dispatch.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

impl<T: Notifier> Notifier for std::sync::Arc<T> {
    fn notify(&self, notification: &Notification) {
        (**self).notify(notification);
    }
}
