#![forbid(unsafe_code)]

//! Race arbitration between the engine data path and native input commits.
//!
//! For one keystroke that commits IME punctuation, two notifications may
//! arrive in either order, each at most once:
//! - [`InputArbiter::on_engine_data`]: the terminal engine wrote the text itself,
//! - [`InputArbiter::on_native_input_commit`]: the host's `input` event fired.
//!
//! The commit path does not decide immediately. It queues a deferred check
//! that the host runs after the current event turn (a JS microtask, an
//! event-loop "after turn" hook, or an explicit call in tests) via
//! [`InputArbiter::run_deferred`]. By then any same-turn engine write has been
//! observed and the check either suppresses the text or forwards it to the
//! [`DataSink`] exactly once.
//!
//! # State machine (per sequence number)
//!
//! ```text
//! IDLE ──keydown/commit──▶ PENDING ──deferred check──┬─▶ SUPPRESSED (engine wrote it)
//!                                                    └─▶ FORWARDED  (sink.write once)
//! ```
//!
//! # Invariants
//!
//! 1. `pending_seq` is 0 or a number `<= seq`.
//! 2. A commit reuses the pending sequence if there is one (coalescing).
//! 3. `handled_seq` and `resolved_seq` only move forward.
//! 4. A sequence `<= resolved_seq` never transitions again, so the sink sees at
//!    most one write per sequence.
//! 5. After [`cleanup`](InputArbiter::cleanup) no entry point mutates state and
//!    no queued check writes.
//!
//! Every entry point degrades to a no-op when the feature flag is disabled or
//! the text is not passthrough punctuation.

use std::collections::VecDeque;

use crate::config::PassthroughConfig;
use crate::flag::PassthroughFlag;
use crate::preferences::PreferenceStore;
use crate::punctuation::contains_ime_punctuation;
use crate::sink::DataSink;
use crate::trace::{DecisionTrace, TraceKind, TraceRecord};

/// Terminal state reached by a sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// The engine already wrote the text; nothing was forwarded.
    Suppressed,
    /// The text was written to the sink.
    Forwarded,
}

/// One deferred check that reached a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommit {
    pub seq: u64,
    pub text: String,
    pub resolution: Resolution,
}

/// Result of a native input commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitOutcome {
    /// Nothing to arbitrate (disabled, composing, not punctuation, torn down).
    Ignored,
    /// A deferred check was queued; the host must call
    /// [`InputArbiter::run_deferred`] after the current turn.
    Deferred { seq: u64 },
}

/// Point-in-time view of the arbiter counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ArbiterSnapshot {
    pub seq: u64,
    pub pending_seq: u64,
    pub handled_seq: u64,
    pub resolved_seq: u64,
    /// Checks queued and not yet run.
    pub deferred: usize,
    pub alive: bool,
}

#[derive(Debug, Clone)]
struct DeferredCheck {
    seq: u64,
    text: String,
}

/// Per-session arbiter for IME punctuation passthrough.
///
/// Single-threaded by construction: every method takes `&mut self` and the
/// host calls them from its event loop.
#[derive(Debug)]
pub struct InputArbiter<P, S> {
    prefs: P,
    sink: S,
    flag: PassthroughFlag,
    seq: u64,
    pending_seq: u64,
    handled_seq: u64,
    resolved_seq: u64,
    deferred: VecDeque<DeferredCheck>,
    alive: bool,
    trace: DecisionTrace,
}

impl<P: PreferenceStore, S: DataSink> InputArbiter<P, S> {
    /// Create an arbiter with the default configuration.
    pub fn new(prefs: P, sink: S) -> Self {
        Self::with_config(prefs, sink, &PassthroughConfig::default())
    }

    pub fn with_config(prefs: P, sink: S, config: &PassthroughConfig) -> Self {
        Self {
            prefs,
            sink,
            flag: config.flag(),
            seq: 0,
            pending_seq: 0,
            handled_seq: 0,
            resolved_seq: 0,
            deferred: VecDeque::new(),
            alive: true,
            trace: DecisionTrace::with_capacity(config.trace_capacity),
        }
    }

    fn enabled(&self) -> bool {
        self.alive && self.flag.is_enabled(&self.prefs)
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn record(&mut self, kind: TraceKind, seq: u64, text: Option<&str>) {
        if !self.trace.is_enabled() {
            return;
        }
        self.trace.push(TraceRecord {
            kind,
            seq,
            pending_seq: self.pending_seq,
            handled_seq: self.handled_seq,
            text: text.map(str::to_owned),
        });
    }

    /// A keydown that may resolve into committed punctuation.
    ///
    /// Allocates a fresh sequence number and marks it pending.
    pub fn keydown_signal(&mut self) {
        if !self.enabled() {
            return;
        }
        let seq = self.next_seq();
        self.pending_seq = seq;
        tracing::trace!(seq, "ime punctuation keydown");
        self.record(TraceKind::Keydown, seq, None);
    }

    /// The terminal engine wrote `text` through its own input path.
    ///
    /// Marks the pending sequence as handled so its deferred check suppresses
    /// the duplicate.
    pub fn on_engine_data(&mut self, text: &str) {
        if !self.enabled() || !contains_ime_punctuation(text) {
            return;
        }
        if self.pending_seq != 0 && self.pending_seq > self.handled_seq {
            self.handled_seq = self.pending_seq;
            tracing::trace!(seq = self.handled_seq, "engine handled ime punctuation");
            self.record(TraceKind::EngineData, self.handled_seq, Some(text));
        }
    }

    /// The host's native input commit carried `text`.
    ///
    /// Returns [`CommitOutcome::Deferred`] when a check was queued.
    pub fn on_native_input_commit(&mut self, text: &str, is_composing: bool) -> CommitOutcome {
        if !self.enabled() || is_composing || !contains_ime_punctuation(text) {
            return CommitOutcome::Ignored;
        }
        let seq = if self.pending_seq != 0 {
            self.pending_seq
        } else {
            self.next_seq()
        };
        self.pending_seq = seq;
        self.deferred.push_back(DeferredCheck {
            seq,
            text: text.to_owned(),
        });
        tracing::trace!(seq, queued = self.deferred.len(), "ime punctuation commit deferred");
        self.record(TraceKind::Commit, seq, Some(text));
        CommitOutcome::Deferred { seq }
    }

    /// Run every queued check, oldest first.
    ///
    /// Must be called strictly after the event turn that queued the checks, so
    /// that same-turn [`on_engine_data`](Self::on_engine_data) calls are
    /// observed. A no-op after [`cleanup`](Self::cleanup).
    ///
    /// Commits coalesced onto one sequence resolve to the first queued text;
    /// later checks for an already resolved sequence are skipped, so their
    /// text is never written.
    pub fn run_deferred(&mut self) -> Vec<ResolvedCommit> {
        let mut resolved = Vec::new();
        while self.alive {
            let Some(check) = self.deferred.pop_front() else {
                break;
            };
            if let Some(done) = self.resolve(check) {
                resolved.push(done);
            }
        }
        resolved
    }

    fn resolve(&mut self, check: DeferredCheck) -> Option<ResolvedCommit> {
        if check.seq <= self.resolved_seq {
            tracing::trace!(seq = check.seq, "coalesced commit already resolved");
            return None;
        }
        let resolution = if self.handled_seq == check.seq {
            Resolution::Suppressed
        } else {
            self.sink.write(&check.text);
            Resolution::Forwarded
        };
        self.resolved_seq = check.seq;
        if self.pending_seq == check.seq {
            self.pending_seq = 0;
        }
        let kind = match resolution {
            Resolution::Suppressed => TraceKind::Suppressed,
            Resolution::Forwarded => TraceKind::Forwarded,
        };
        tracing::trace!(seq = check.seq, ?resolution, "ime punctuation resolved");
        self.record(kind, check.seq, Some(&check.text));
        Some(ResolvedCommit {
            seq: check.seq,
            text: check.text,
            resolution,
        })
    }

    /// Tear down: drop queued checks and ignore every later call.
    pub fn cleanup(&mut self) {
        if !self.alive {
            return;
        }
        let dropped = self.deferred.len();
        self.deferred.clear();
        self.alive = false;
        tracing::debug!(dropped, "ime punctuation arbiter torn down");
        self.record(TraceKind::Cleanup, 0, None);
    }

    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Resolve the feature flag now (never cached).
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.flag.is_enabled(&self.prefs)
    }

    #[must_use]
    pub fn snapshot(&self) -> ArbiterSnapshot {
        ArbiterSnapshot {
            seq: self.seq,
            pending_seq: self.pending_seq,
            handled_seq: self.handled_seq,
            resolved_seq: self.resolved_seq,
            deferred: self.deferred.len(),
            alive: self.alive,
        }
    }

    #[must_use]
    pub fn prefs(&self) -> &P {
        &self.prefs
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    #[must_use]
    pub fn trace(&self) -> &DecisionTrace {
        &self.trace
    }

    /// Drain the decision trace as JSONL lines.
    pub fn drain_trace_jsonl(&mut self) -> Result<Vec<String>, serde_json::Error> {
        self.trace.drain_jsonl()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flag::IME_PUNCT_FLAG_KEY;
    use crate::preferences::MemoryPreferences;
    use crate::sink::RecordingSink;

    fn arbiter() -> InputArbiter<MemoryPreferences, RecordingSink> {
        InputArbiter::new(MemoryPreferences::new(), RecordingSink::new())
    }

    #[test]
    fn commit_without_engine_data_forwards_once() {
        let mut arb = arbiter();
        assert_eq!(
            arb.on_native_input_commit(",", false),
            CommitOutcome::Deferred { seq: 1 }
        );
        assert!(arb.sink().writes().is_empty(), "decision must be deferred");
        let resolved = arb.run_deferred();
        assert_eq!(arb.sink().writes(), [",".to_string()]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].resolution, Resolution::Forwarded);
        assert_eq!(arb.snapshot().pending_seq, 0);
    }

    #[test]
    fn same_turn_engine_data_suppresses() {
        let mut arb = arbiter();
        arb.on_native_input_commit(",", false);
        arb.on_engine_data(",");
        let resolved = arb.run_deferred();
        assert!(arb.sink().writes().is_empty());
        assert_eq!(resolved[0].resolution, Resolution::Suppressed);
    }

    #[test]
    fn keydown_then_engine_then_commit_suppresses() {
        let mut arb = arbiter();
        arb.keydown_signal();
        arb.on_engine_data("，");
        assert_eq!(
            arb.on_native_input_commit("，", false),
            CommitOutcome::Deferred { seq: 1 }
        );
        arb.run_deferred();
        assert!(arb.sink().writes().is_empty());
    }

    #[test]
    fn composing_commit_is_ignored() {
        let mut arb = arbiter();
        assert_eq!(arb.on_native_input_commit("。", true), CommitOutcome::Ignored);
        arb.run_deferred();
        assert!(arb.sink().writes().is_empty());
        assert_eq!(arb.snapshot(), ArbiterSnapshot { alive: true, ..Default::default() });
    }

    #[test]
    fn non_punctuation_touches_nothing() {
        let mut arb = arbiter();
        arb.keydown_signal();
        let before = arb.snapshot();
        arb.on_engine_data("a");
        assert_eq!(arb.on_native_input_commit("你好", false), CommitOutcome::Ignored);
        assert_eq!(arb.snapshot(), before);
    }

    #[test]
    fn disabled_flag_is_inert() {
        let prefs = MemoryPreferences::with_value(IME_PUNCT_FLAG_KEY, "0");
        let mut arb = InputArbiter::new(prefs, RecordingSink::new());
        arb.keydown_signal();
        arb.on_engine_data(",");
        assert_eq!(arb.on_native_input_commit(",", false), CommitOutcome::Ignored);
        arb.run_deferred();
        assert!(arb.sink().writes().is_empty());
        assert_eq!(arb.snapshot(), ArbiterSnapshot { alive: true, ..Default::default() });
    }

    #[test]
    fn commit_reuses_keydown_sequence() {
        let mut arb = arbiter();
        arb.keydown_signal();
        arb.keydown_signal();
        assert_eq!(arb.snapshot().pending_seq, 2);
        assert_eq!(
            arb.on_native_input_commit(",", false),
            CommitOutcome::Deferred { seq: 2 }
        );
    }

    #[test]
    fn coalesced_commits_write_at_most_once() {
        let mut arb = arbiter();
        arb.on_native_input_commit(",", false);
        arb.on_native_input_commit(",", false);
        assert_eq!(arb.snapshot().deferred, 2);
        let resolved = arb.run_deferred();
        assert_eq!(resolved.len(), 1);
        assert_eq!(arb.sink().writes().len(), 1);
    }

    #[test]
    fn coalesced_commits_resolve_to_first_text() {
        let mut arb = arbiter();
        assert_eq!(
            arb.on_native_input_commit(",", false),
            CommitOutcome::Deferred { seq: 1 }
        );
        assert_eq!(
            arb.on_native_input_commit("。", false),
            CommitOutcome::Deferred { seq: 1 }
        );
        let resolved = arb.run_deferred();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].text, ",");
        assert_eq!(arb.sink().writes(), [",".to_string()]);
        assert_eq!(arb.snapshot().deferred, 0);
    }

    #[test]
    fn consecutive_keystrokes_each_forward() {
        let mut arb = arbiter();
        for text in [",", "。", "？"] {
            arb.on_native_input_commit(text, false);
            arb.run_deferred();
        }
        assert_eq!(arb.sink().writes(), [",", "。", "？"].map(String::from));
        let snap = arb.snapshot();
        assert_eq!(snap.seq, 3);
        assert_eq!(snap.resolved_seq, 3);
    }

    #[test]
    fn engine_data_marks_handled_once() {
        let mut arb = arbiter();
        arb.keydown_signal();
        arb.on_engine_data(",");
        arb.on_engine_data(",");
        assert_eq!(arb.snapshot().handled_seq, 1);
        let kinds: Vec<TraceKind> = arb.trace().records().iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![TraceKind::Keydown, TraceKind::EngineData]);
    }

    #[test]
    fn engine_data_without_pending_is_noop() {
        let mut arb = arbiter();
        arb.on_engine_data(",");
        assert_eq!(arb.snapshot().handled_seq, 0);
    }

    #[test]
    fn newer_commit_keeps_pending_when_older_check_runs() {
        let mut arb = arbiter();
        arb.on_native_input_commit(",", false);
        // A keydown for the next keystroke supersedes the in-flight sequence.
        arb.keydown_signal();
        arb.run_deferred();
        assert_eq!(arb.sink().writes(), [",".to_string()]);
        assert_eq!(arb.snapshot().pending_seq, 2);
    }

    #[test]
    fn cleanup_cancels_queued_checks() {
        let mut arb = arbiter();
        arb.on_native_input_commit(",", false);
        arb.cleanup();
        assert!(arb.run_deferred().is_empty());
        assert!(arb.sink().writes().is_empty());
        arb.keydown_signal();
        assert_eq!(arb.on_native_input_commit(",", false), CommitOutcome::Ignored);
        assert!(!arb.snapshot().alive);
        assert_eq!(arb.snapshot().seq, 1);
    }

    #[test]
    fn flag_flip_between_calls_takes_effect() {
        let prefs = MemoryPreferences::new();
        let mut arb = InputArbiter::new(&prefs, RecordingSink::new());
        arb.on_native_input_commit(",", false);
        prefs.set(IME_PUNCT_FLAG_KEY, "0");
        assert!(!arb.is_enabled());
        assert_eq!(arb.on_native_input_commit("。", false), CommitOutcome::Ignored);
        // Checks queued while enabled still resolve.
        arb.run_deferred();
        assert_eq!(arb.sink().writes(), [",".to_string()]);
    }

    #[test]
    fn trace_jsonl_follows_transitions() {
        let mut arb = arbiter();
        arb.on_native_input_commit(",", false);
        arb.on_engine_data(",");
        arb.run_deferred();
        let lines = arb.drain_trace_jsonl().unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains(r#""kind":"commit""#));
        assert!(lines[1].contains(r#""kind":"engine_data""#));
        assert!(lines[2].contains(r#""kind":"suppressed""#));
    }
}
