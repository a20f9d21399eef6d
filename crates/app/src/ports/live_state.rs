//! Live state port: where the current production-tool state comes from.

use stagehand_domain::state::LiveState;

/// Supplies the latest [`LiveState`] snapshot of the production tool.
pub trait LiveStateSource: Send + Sync {
    fn snapshot(&self) -> LiveState;
}

impl<T: LiveStateSource> LiveStateSource for std::sync::Arc<T> {
    fn snapshot(&self) -> LiveState {
        (**self).snapshot()
    }
}
