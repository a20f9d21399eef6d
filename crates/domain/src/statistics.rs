//! Engine statistics.

use serde::{Deserialize, Serialize};

/// Counters exposed by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatistics {
    pub total_rules: usize,
    pub enabled_rules: usize,
    /// Number of gate passes since the engine was created.
    pub total_triggers: u64,
}
