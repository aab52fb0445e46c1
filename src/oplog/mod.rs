//! Append-only operation log
//!
//! Every public engine operation appends one [`OperationLogEntry`]. The log is
//! owned by the caller's session and handed to each operation explicitly, so
//! independent sessions never share state. Appends from threads sharing one
//! log are serialized through a mutex.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Small, ordered summary of an operation's parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamsDigest(BTreeMap<String, Value>);

impl ParamsDigest {
    /// Create an empty digest
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Look up a parameter
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no parameters were recorded
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A single log record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationLogEntry {
    /// Position in the log since the last clear
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub params: ParamsDigest,
}

#[derive(Debug, Default)]
struct LogState {
    entries: Vec<OperationLogEntry>,
    next_sequence: u64,
}

/// Append-only record of engine invocations
#[derive(Debug, Default)]
pub struct OperationLog {
    state: Mutex<LogState>,
}

impl OperationLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return a copy of it
    pub fn record(&self, operation: impl Into<String>, params: ParamsDigest) -> OperationLogEntry {
        let mut state = self.state.lock();

        let entry = OperationLogEntry {
            sequence: state.next_sequence,
            timestamp: Utc::now(),
            operation: operation.into(),
            params,
        };
        state.next_sequence += 1;
        state.entries.push(entry.clone());

        tracing::debug!(
            sequence = entry.sequence,
            operation = %entry.operation,
            "Operation recorded"
        );
        entry
    }

    /// Snapshot of all entries in append order
    pub fn history(&self) -> Vec<OperationLogEntry> {
        self.state.lock().entries.clone()
    }

    /// Entries for a single operation name, in append order
    pub fn history_for(&self, operation: &str) -> Vec<OperationLogEntry> {
        self.state
            .lock()
            .entries
            .iter()
            .filter(|e| e.operation == operation)
            .cloned()
            .collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// True if nothing has been recorded since the last clear
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Drop all entries and restart sequence numbering
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.next_sequence = 0;
    }
}
