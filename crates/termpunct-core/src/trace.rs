#![forbid(unsafe_code)]

//! Bounded decision trace for record/replay.
//!
//! Every state transition the arbiter makes can be captured as a
//! [`TraceRecord`] and drained as JSONL. Records carry the sequence counters
//! after the transition so a replay can be checked line by line.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Default number of records kept before the oldest are dropped.
pub const DEFAULT_TRACE_CAPACITY: usize = 2048;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    Keydown,
    EngineData,
    Commit,
    Suppressed,
    Forwarded,
    Cleanup,
}

/// One arbiter transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub kind: TraceKind,
    /// Sequence number the transition refers to (0 when none).
    pub seq: u64,
    pub pending_seq: u64,
    pub handled_seq: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Ring of recent [`TraceRecord`]s. Capacity 0 disables recording.
#[derive(Debug, Clone)]
pub struct DecisionTrace {
    records: VecDeque<TraceRecord>,
    capacity: usize,
    dropped: u64,
}

impl Default for DecisionTrace {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_TRACE_CAPACITY)
    }
}

impl DecisionTrace {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            capacity,
            dropped: 0,
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records evicted because the ring was full.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Records currently held, oldest first.
    #[must_use]
    pub fn records(&self) -> &VecDeque<TraceRecord> {
        &self.records
    }

    pub fn push(&mut self, record: TraceRecord) {
        if self.capacity == 0 {
            return;
        }
        if self.records.len() >= self.capacity {
            self.records.pop_front();
            self.dropped += 1;
        }
        self.records.push_back(record);
    }

    /// Drain all records, oldest first.
    pub fn drain(&mut self) -> Vec<TraceRecord> {
        std::mem::take(&mut self.records).into()
    }

    /// Drain all records as JSONL lines, oldest first.
    ///
    /// Errors only if `serde_json` fails to serialize a record.
    pub fn drain_jsonl(&mut self) -> Result<Vec<String>, serde_json::Error> {
        self.drain().iter().map(serde_json::to_string).collect()
    }
}
