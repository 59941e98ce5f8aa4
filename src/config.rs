//! Runtime tuning for a machine.

use serde::{Deserialize, Serialize};

/// Default cap on chained transitions within one tick.
pub const DEFAULT_SETTLE_LIMIT: usize = 32;

/// Default number of transition records kept per machine.
pub const DEFAULT_HISTORY_CAPACITY: usize = 64;

/// Per-machine configuration.
///
/// Missing fields fall back to their defaults when deserialized:
///
/// ```rust
/// use hfsm::MachineConfig;
///
/// let config: MachineConfig = serde_json::from_str(r#"{ "settle_limit": 4 }"#).unwrap();
/// assert_eq!(config.settle_limit, 4);
/// assert_eq!(config.history_capacity, hfsm::config::DEFAULT_HISTORY_CAPACITY);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Maximum number of state changes a single tick may chain before the
    /// update is aborted with `SettleLimitExceeded`.
    pub settle_limit: usize,

    /// Number of transition records kept in the machine's history. Zero
    /// disables recording.
    pub history_capacity: usize,
}

impl MachineConfig {
    pub fn with_settle_limit(mut self, limit: usize) -> Self {
        self.settle_limit = limit;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            settle_limit: DEFAULT_SETTLE_LIMIT,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}
