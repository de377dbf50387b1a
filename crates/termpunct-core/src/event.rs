#![forbid(unsafe_code)]

//! Deterministic, JSON-friendly event schema for the passthrough controller.
//!
//! Hosts translate native element events (DOM `keydown`, `composition*`,
//! `input`, `blur`) and engine notifications into [`SurfaceEvent`]s. The JSON
//! encoding is a `kind` tag plus the minimum fields needed for replay, so a
//! recorded session can be fed back through
//! [`ImePunctuationController::replay_jsonl`](crate::controller::ImePunctuationController::replay_jsonl).
//!
//! ```json
//! {"kind":"keydown","key":","}
//! {"kind":"input","data":"，"}
//! {"kind":"engine_data","data":"，"}
//! {"kind":"turn_end"}
//! ```

use serde::{Deserialize, Serialize};

use crate::composition::CompositionPhase;

/// One event reaching the controller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SurfaceEvent {
    /// Native `keydown` with its DOM `key` value.
    Keydown { key: String },
    CompositionStart,
    CompositionUpdate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<String>,
    },
    CompositionEnd {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<String>,
    },
    /// Native `input` commit. `data` is absent for deletions and some
    /// synthetic events.
    Input {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<String>,
        /// Host-reported `InputEvent.isComposing`.
        #[serde(default, skip_serializing_if = "is_false")]
        is_composing: bool,
    },
    /// The text-input element lost focus.
    Blur,
    /// The terminal engine wrote `data` through its own input path.
    EngineData { data: String },
    /// The current event turn finished; deferred checks may run.
    TurnEnd,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

impl SurfaceEvent {
    /// Convenience constructor for a plain (non-composing) input commit.
    #[must_use]
    pub fn input(data: impl Into<String>) -> Self {
        Self::Input {
            data: Some(data.into()),
            is_composing: false,
        }
    }

    /// Composition edge carried by this event, if any. Focus loss cancels
    /// the open session.
    #[must_use]
    pub const fn composition_phase(&self) -> Option<CompositionPhase> {
        match self {
            Self::CompositionStart => Some(CompositionPhase::Start),
            Self::CompositionUpdate { .. } => Some(CompositionPhase::Update),
            Self::CompositionEnd { .. } => Some(CompositionPhase::End),
            Self::Blur => Some(CompositionPhase::Cancel),
            _ => None,
        }
    }

    /// Encode this event as a stable JSON string.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a previously encoded event.
    ///
    /// Errors occur if the JSON does not match the schema.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
