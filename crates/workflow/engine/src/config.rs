//! Engine tuning knobs

use serde::{Deserialize, Serialize};

/// Thresholds used by deadline and workload analytics
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// A workflow is near its deadline when at most this many days remain
    pub near_deadline_days: i64,

    /// Active assignments that count as a full workload
    pub workload_threshold: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            near_deadline_days: 3,
            workload_threshold: 10,
        }
    }
}
