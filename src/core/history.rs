//! Bounded log of recent state changes.
//!
//! Each machine records the transitions it performs so callers can inspect
//! how a tick unfolded. The log is capped; the oldest records are dropped
//! first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single state change inside one machine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Name of the state that was exited
    pub from: String,
    /// Name of the state that was entered
    pub to: String,
    /// When the change happened
    pub timestamp: DateTime<Utc>,
}

/// Ordered, capacity-bounded history of state changes.
///
/// # Example
///
/// ```rust
/// use hfsm::TransitionLog;
///
/// let mut log = TransitionLog::new(2);
/// log.record("a", "b");
/// log.record("b", "c");
/// log.record("c", "d");
///
/// assert_eq!(log.len(), 2);
/// assert_eq!(log.path(), vec!["b", "c", "d"]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionLog {
    records: VecDeque<TransitionRecord>,
    capacity: usize,
}

impl TransitionLog {
    /// Create an empty log holding at most `capacity` records.
    ///
    /// A capacity of zero disables recording.
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a record, evicting the oldest one when full.
    pub fn record(&mut self, from: impl Into<String>, to: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(TransitionRecord {
            from: from.into(),
            to: to.into(),
            timestamp: Utc::now(),
        });
    }

    /// Records from oldest to newest.
    pub fn records(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    /// The most recent record.
    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.back()
    }

    /// State names visited, starting with the `from` of the oldest retained
    /// record.
    pub fn path(&self) -> Vec<&str> {
        let mut path = Vec::with_capacity(self.records.len() + 1);
        if let Some(first) = self.records.front() {
            path.push(first.from.as_str());
        }
        path.extend(self.records.iter().map(|r| r.to.as_str()));
        path
    }

    /// Time between the oldest and the newest retained record.
    pub fn duration(&self) -> Option<Duration> {
        let first = self.records.front()?;
        let last = self.records.back()?;
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl Default for TransitionLog {
    fn default() -> Self {
        Self::new(64)
    }
}
