#![forbid(unsafe_code)]

//! IME composition session tracking.
//!
//! While a composition session is open (between `compositionstart` and
//! `compositionend`) the terminal engine owns the eventual commit, so native
//! `input` events must not be arbitrated. Hosts do not always deliver a clean
//! start/end pairing; the tracker normalizes the stream:
//!
//! - `update` without a prior `start` opens a session,
//! - `start` while already active restarts the session (counted as a cancel),
//! - focus loss while active cancels the session.

/// Composition lifecycle edge observed by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositionPhase {
    Start,
    Update,
    End,
    /// Session abandoned without a commit (focus loss).
    Cancel,
}

/// What a phase did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositionTransition {
    Opened,
    /// `start` arrived while a session was active; the old one was dropped.
    Restarted,
    Continued,
    Closed,
    /// An edge that does not change state (for example `end` while idle).
    Unchanged,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompositionTracker {
    active: bool,
    sessions: u64,
    cancelled: u64,
}

impl CompositionTracker {
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Sessions opened so far.
    #[must_use]
    pub const fn sessions(&self) -> u64 {
        self.sessions
    }

    /// Sessions dropped by restart, cancel or focus loss.
    #[must_use]
    pub const fn cancelled(&self) -> u64 {
        self.cancelled
    }

    pub fn apply(&mut self, phase: CompositionPhase) -> CompositionTransition {
        match phase {
            CompositionPhase::Start => {
                self.sessions += 1;
                if self.active {
                    self.cancelled += 1;
                    CompositionTransition::Restarted
                } else {
                    self.active = true;
                    CompositionTransition::Opened
                }
            }
            CompositionPhase::Update => {
                if self.active {
                    CompositionTransition::Continued
                } else {
                    self.active = true;
                    self.sessions += 1;
                    CompositionTransition::Opened
                }
            }
            CompositionPhase::End => {
                if self.active {
                    self.active = false;
                    CompositionTransition::Closed
                } else {
                    CompositionTransition::Unchanged
                }
            }
            CompositionPhase::Cancel => {
                if self.active {
                    self.active = false;
                    self.cancelled += 1;
                    CompositionTransition::Closed
                } else {
                    CompositionTransition::Unchanged
                }
            }
        }
    }
}
