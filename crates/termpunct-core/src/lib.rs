#![forbid(unsafe_code)]

//! IME punctuation passthrough for terminal front ends.
//!
//! When an IME commits punctuation (`，`, `。`, `,` ...) two notifications can
//! reach a terminal front end for the same keystroke: the terminal engine's own
//! data path, and the host's native `input` commit event. Either may arrive
//! first, and either may be missing. This crate decides, per keystroke, whether
//! the committed text still has to be forwarded to the outgoing data sink so
//! that the stream carries it exactly once.
//!
//! The crate is host-agnostic and deterministic:
//! - [`arbiter::InputArbiter`] owns the sequence counters and a queue of
//!   deferred checks that the host drains after the current event turn,
//! - [`controller::ImePunctuationController`] wires native element events
//!   (composition start/end, input, keydown) into the arbiter,
//! - [`preferences`] and [`flag`] resolve the fail-open feature flag,
//! - [`trace`] records decisions as JSONL for record/replay.
//!
//! # Example
//!
//! ```
//! use termpunct_core::arbiter::InputArbiter;
//! use termpunct_core::preferences::MemoryPreferences;
//! use termpunct_core::sink::RecordingSink;
//!
//! let mut arbiter = InputArbiter::new(MemoryPreferences::new(), RecordingSink::new());
//!
//! // Native commit with no engine write: forwarded once.
//! arbiter.on_native_input_commit(",", false);
//! arbiter.run_deferred();
//! assert_eq!(arbiter.sink().writes(), [",".to_string()]);
//!
//! // Engine already wrote it in the same turn: suppressed.
//! arbiter.on_native_input_commit("。", false);
//! arbiter.on_engine_data("。");
//! arbiter.run_deferred();
//! assert_eq!(arbiter.sink().writes().len(), 1);
//! ```

pub mod arbiter;
pub mod composition;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod flag;
pub mod preferences;
pub mod punctuation;
pub mod sink;
pub mod trace;

pub use arbiter::{ArbiterSnapshot, InputArbiter, Resolution};
pub use config::PassthroughConfig;
pub use controller::ImePunctuationController;
pub use error::{ConfigError, PreferenceError};
pub use event::SurfaceEvent;
pub use flag::PassthroughFlag;
pub use preferences::PreferenceStore;
pub use sink::DataSink;
