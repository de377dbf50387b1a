#![forbid(unsafe_code)]

//! Error types for preference reads and configuration loading.
//!
//! None of these ever escape the arbiter: a failed preference read resolves
//! the feature flag to enabled (see [`crate::flag`]).

use std::fmt;

/// Errors that can occur while reading a persisted preference.
#[derive(Debug)]
pub enum PreferenceError {
    /// The backing store does not exist in this environment.
    Unavailable(String),
    /// I/O error while reading a file-backed store.
    Io(std::io::Error),
    /// The store exists but its contents could not be interpreted.
    Corruption(String),
}

impl fmt::Display for PreferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreferenceError::Unavailable(msg) => write!(f, "preference store unavailable: {msg}"),
            PreferenceError::Io(e) => write!(f, "I/O error: {e}"),
            PreferenceError::Corruption(msg) => write!(f, "preference store corruption: {msg}"),
        }
    }
}

impl std::error::Error for PreferenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PreferenceError::Io(e) => Some(e),
            PreferenceError::Unavailable(_) | PreferenceError::Corruption(_) => None,
        }
    }
}

impl From<std::io::Error> for PreferenceError {
    fn from(e: std::io::Error) -> Self {
        PreferenceError::Io(e)
    }
}

/// Result type for preference reads.
pub type PreferenceResult<T> = Result<T, PreferenceError>;

/// Errors produced while loading a [`PassthroughConfig`](crate::config::PassthroughConfig).
#[derive(Debug)]
pub enum ConfigError {
    /// The JSON document did not match the config schema.
    Parse(serde_json::Error),
    /// A field had a value outside its accepted range.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}
