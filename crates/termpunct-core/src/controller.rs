#![forbid(unsafe_code)]

//! The object a terminal view holds for IME punctuation passthrough.
//!
//! [`ImePunctuationController`] combines an [`InputArbiter`] with composition
//! tracking and routes native element events into it:
//!
//! | Event | Effect |
//! |-------|--------|
//! | `keydown` on a halfwidth punctuation key | [`InputArbiter::keydown_signal`] |
//! | `composition*`, `blur` | updates the composition session |
//! | `input` | [`InputArbiter::on_native_input_commit`], composing while a session is open |
//! | engine data | [`InputArbiter::on_engine_data`] |
//! | turn end | [`InputArbiter::run_deferred`] |
//!
//! The host owns listener registration; after [`cleanup`](ImePunctuationController::cleanup)
//! every dispatch is ignored and queued checks never write.

use crate::arbiter::{CommitOutcome, InputArbiter, ResolvedCommit};
use crate::composition::CompositionTracker;
use crate::config::PassthroughConfig;
use crate::event::SurfaceEvent;
use crate::preferences::PreferenceStore;
use crate::punctuation::is_passthrough_key;
use crate::sink::DataSink;

/// Result of dispatching one [`SurfaceEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The event changed nothing observable, or only internal state.
    Handled,
    /// An input commit queued a deferred check; schedule a turn-end drain.
    Deferred { seq: u64 },
    /// A turn-end drain resolved these commits.
    Resolved(Vec<ResolvedCommit>),
    /// The controller is detached.
    Detached,
}

#[derive(Debug)]
pub struct ImePunctuationController<P, S> {
    arbiter: InputArbiter<P, S>,
    composition: CompositionTracker,
    attached: bool,
}

impl<P: PreferenceStore, S: DataSink> ImePunctuationController<P, S> {
    /// Create the per-view state. Listeners are the host's to register.
    pub fn attach(prefs: P, sink: S, config: &PassthroughConfig) -> Self {
        tracing::debug!(flag_key = %config.flag_key, "ime punctuation passthrough attached");
        Self {
            arbiter: InputArbiter::with_config(prefs, sink, config),
            composition: CompositionTracker::default(),
            attached: true,
        }
    }

    /// Host detected a keydown that may commit IME punctuation.
    pub fn on_ime_punctuation_keydown(&mut self) {
        self.arbiter.keydown_signal();
    }

    /// Engine data callback (the terminal's `onData`).
    pub fn handle_on_data(&mut self, data: &str) {
        self.arbiter.on_engine_data(data);
    }

    pub fn dispatch(&mut self, event: &SurfaceEvent) -> Dispatch {
        if !self.attached {
            return Dispatch::Detached;
        }
        if let Some(phase) = event.composition_phase() {
            self.composition.apply(phase);
            return Dispatch::Handled;
        }
        match event {
            SurfaceEvent::Keydown { key } => {
                if is_passthrough_key(key) {
                    self.arbiter.keydown_signal();
                }
                Dispatch::Handled
            }
            SurfaceEvent::Input { data, is_composing } => {
                let Some(data) = data.as_deref() else {
                    return Dispatch::Handled;
                };
                let composing = *is_composing || self.composition.is_active();
                match self.arbiter.on_native_input_commit(data, composing) {
                    CommitOutcome::Deferred { seq } => Dispatch::Deferred { seq },
                    CommitOutcome::Ignored => Dispatch::Handled,
                }
            }
            SurfaceEvent::EngineData { data } => {
                self.arbiter.on_engine_data(data);
                Dispatch::Handled
            }
            SurfaceEvent::TurnEnd => Dispatch::Resolved(self.arbiter.run_deferred()),
            SurfaceEvent::CompositionStart
            | SurfaceEvent::CompositionUpdate { .. }
            | SurfaceEvent::CompositionEnd { .. }
            | SurfaceEvent::Blur => Dispatch::Handled,
        }
    }

    /// Run deferred checks; call after the event turn that queued them.
    pub fn run_deferred(&mut self) -> Vec<ResolvedCommit> {
        self.arbiter.run_deferred()
    }

    /// Feed a JSONL event script through [`dispatch`](Self::dispatch).
    ///
    /// Blank lines are skipped. Pending checks are drained after the last
    /// line, as a host would at the end of its final turn. Returns every
    /// resolved commit in order.
    pub fn replay_jsonl(&mut self, script: &str) -> Result<Vec<ResolvedCommit>, serde_json::Error> {
        let mut resolved = Vec::new();
        for line in script.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let event = SurfaceEvent::from_json_str(line)?;
            if let Dispatch::Resolved(batch) = self.dispatch(&event) {
                resolved.extend(batch);
            }
        }
        resolved.extend(self.arbiter.run_deferred());
        Ok(resolved)
    }

    /// Detach from the view. Idempotent.
    pub fn cleanup(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;
        self.arbiter.cleanup();
    }

    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.attached
    }

    #[must_use]
    pub const fn composition(&self) -> &CompositionTracker {
        &self.composition
    }

    #[must_use]
    pub fn arbiter(&self) -> &InputArbiter<P, S> {
        &self.arbiter
    }

    pub fn arbiter_mut(&mut self) -> &mut InputArbiter<P, S> {
        &mut self.arbiter
    }
}
