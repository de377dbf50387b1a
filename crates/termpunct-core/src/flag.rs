#![forbid(unsafe_code)]

//! The passthrough feature flag.
//!
//! Resolution rules:
//! - the stored value `"0"` disables passthrough,
//! - any other value, a missing key, or a store that fails to read leaves it
//!   enabled.
//!
//! The flag is resolved at every decision point and never cached, so a user
//! toggling the preference takes effect on the next keystroke.

use crate::preferences::PreferenceStore;

/// Preference key holding the passthrough toggle.
pub const IME_PUNCT_FLAG_KEY: &str = "SUPERSET_TERMINAL_IME_PUNCT";

/// Stored value that turns passthrough off.
pub const DISABLED_VALUE: &str = "0";

/// Fail-open resolver for the passthrough feature flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassthroughFlag {
    key: String,
}

impl Default for PassthroughFlag {
    fn default() -> Self {
        Self::new(IME_PUNCT_FLAG_KEY)
    }
}

impl PassthroughFlag {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Resolve the flag against `store`. Never fails.
    #[must_use]
    pub fn is_enabled<P: PreferenceStore + ?Sized>(&self, store: &P) -> bool {
        match store.get(&self.key) {
            Ok(Some(value)) => value != DISABLED_VALUE,
            Ok(None) => true,
            Err(err) => {
                tracing::debug!(
                    store = store.name(),
                    key = %self.key,
                    error = %err,
                    "preference read failed; passthrough stays enabled"
                );
                true
            }
        }
    }
}
