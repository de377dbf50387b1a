#![forbid(unsafe_code)]

//! Configuration for the passthrough controller.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::flag::{IME_PUNCT_FLAG_KEY, PassthroughFlag};
use crate::trace::DEFAULT_TRACE_CAPACITY;

/// Environment override for [`PassthroughConfig::flag_key`].
pub const ENV_FLAG_KEY: &str = "TERMPUNCT_FLAG_KEY";
/// Environment override for [`PassthroughConfig::trace_capacity`].
pub const ENV_TRACE_CAPACITY: &str = "TERMPUNCT_TRACE_CAPACITY";

/// Configuration for [`ImePunctuationController`](crate::controller::ImePunctuationController).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassthroughConfig {
    /// Preference key holding the feature flag.
    pub flag_key: String,
    /// Maximum decision-trace records kept (0 disables the trace).
    pub trace_capacity: usize,
}

impl Default for PassthroughConfig {
    fn default() -> Self {
        Self {
            flag_key: IME_PUNCT_FLAG_KEY.to_string(),
            trace_capacity: DEFAULT_TRACE_CAPACITY,
        }
    }
}

impl PassthroughConfig {
    #[must_use]
    pub fn with_flag_key(mut self, key: impl Into<String>) -> Self {
        self.flag_key = key.into();
        self
    }

    #[must_use]
    pub fn with_trace_capacity(mut self, capacity: usize) -> Self {
        self.trace_capacity = capacity;
        self
    }

    /// Parse a JSON config document. Missing fields take their defaults.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `TERMPUNCT_FLAG_KEY` / `TERMPUNCT_TRACE_CAPACITY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_FLAG_KEY) {
            self.flag_key = key;
        }
        if let Some(raw) = lookup(ENV_TRACE_CAPACITY) {
            self.trace_capacity = raw.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("{ENV_TRACE_CAPACITY}={raw:?} is not a count"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flag_key.is_empty() {
            return Err(ConfigError::Invalid("flag_key must not be empty".into()));
        }
        Ok(())
    }

    #[must_use]
    pub fn flag(&self) -> PassthroughFlag {
        PassthroughFlag::new(self.flag_key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PassthroughConfig::default();
        assert_eq!(config.flag_key, IME_PUNCT_FLAG_KEY);
        assert_eq!(config.trace_capacity, DEFAULT_TRACE_CAPACITY);
    }

    #[test]
    fn json_partial_document_keeps_defaults() {
        let config = PassthroughConfig::from_json_str(r#"{"trace_capacity": 16}"#).unwrap();
        assert_eq!(config.trace_capacity, 16);
        assert_eq!(config.flag_key, IME_PUNCT_FLAG_KEY);
    }

    #[test]
    fn json_rejects_empty_key() {
        let err = PassthroughConfig::from_json_str(r#"{"flag_key": ""}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn json_rejects_wrong_types() {
        let err = PassthroughConfig::from_json_str(r#"{"trace_capacity": "many"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn env_overrides_apply() {
        let config = PassthroughConfig::default()
            .with_env_overrides(|name| match name {
                ENV_FLAG_KEY => Some("CUSTOM".into()),
                ENV_TRACE_CAPACITY => Some(" 0 ".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.flag_key, "CUSTOM");
        assert_eq!(config.trace_capacity, 0);
    }

    #[test]
    fn from_env_matches_process_environment() {
        let expected = PassthroughConfig::default()
            .with_env_overrides(|name| std::env::var(name).ok())
            .ok();
        assert_eq!(PassthroughConfig::from_env().ok(), expected);
        if std::env::var_os(ENV_FLAG_KEY).is_none() && std::env::var_os(ENV_TRACE_CAPACITY).is_none() {
            assert_eq!(PassthroughConfig::from_env().unwrap(), PassthroughConfig::default());
        }
    }

    #[test]
    fn env_bad_capacity_is_invalid() {
        let err = PassthroughConfig::default()
            .with_env_overrides(|name| (name == ENV_TRACE_CAPACITY).then(|| "lots".into()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
