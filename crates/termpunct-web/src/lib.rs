#![forbid(unsafe_code)]

//! WASM host binding for IME punctuation passthrough.
//!
//! The browser side of a terminal view creates one
//! `ImePunctuationPassthrough` per terminal instance:
//!
//! ```js
//! const passthrough = new ImePunctuationPassthrough(term.textarea, (data) => pty.write(data));
//! term.onData((data) => passthrough.handleOnData(data));
//! // in the custom key handler, for punctuation keydowns:
//! passthrough.onImePunctuationKeydown();
//! // on dispose:
//! passthrough.cleanup();
//! ```
//!
//! DOM event names are mapped to [`termpunct_core::SurfaceEvent`]s by
//! [`dom`], which is target-independent so the mapping is tested natively.
//! Listener registration and write delivery live in [`host`], generic over
//! the event target. The `wasm-bindgen` surface itself only exists on
//! `wasm32`.

pub mod dom;
pub mod host;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{ImePunctuationPassthrough, LocalStoragePreferences};

pub use termpunct_core;

/// Native builds compile this crate as a stub so `cargo check --workspace` stays
/// green on non-wasm targets.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct ImePunctuationPassthrough;

#[cfg(not(target_arch = "wasm32"))]
impl ImePunctuationPassthrough {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self
    }
}
