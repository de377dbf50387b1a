#![forbid(unsafe_code)]

//! Synchronous preference stores.
//!
//! The passthrough feature flag lives in a persisted user preference. The
//! arbiter never touches storage directly; it reads through a
//! [`PreferenceStore`] injected by the host.
//!
//! # Backends
//!
//! | Backend | Source | Typical use |
//! |---------|--------|-------------|
//! | [`MemoryPreferences`] | in-memory map | tests, ephemeral sessions |
//! | [`EnvPreferences`] | environment variables | native hosts, CI |
//! | [`FilePreferences`] | flat JSON object file | desktop hosts |
//! | [`FnPreferences`] | closure | adapters over host stores |
//!
//! A missing key is `Ok(None)`. A store that cannot be read returns an error;
//! callers decide how to degrade.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::{PreferenceError, PreferenceResult};

/// A synchronous key/value preference reader.
pub trait PreferenceStore {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> PreferenceResult<Option<String>>;
}

/// Adapter turning a lookup closure into a [`PreferenceStore`].
pub struct FnPreferences<F>(pub F);

impl<F> PreferenceStore for FnPreferences<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn name(&self) -> &str {
        "FnPreferences"
    }

    fn get(&self, key: &str) -> PreferenceResult<Option<String>> {
        Ok((self.0)(key))
    }
}

impl<F> fmt::Debug for FnPreferences<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnPreferences")
    }
}

impl<P: PreferenceStore + ?Sized> PreferenceStore for &P {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn get(&self, key: &str) -> PreferenceResult<Option<String>> {
        (**self).get(key)
    }
}

impl<P: PreferenceStore + ?Sized> PreferenceStore for std::rc::Rc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn get(&self, key: &str) -> PreferenceResult<Option<String>> {
        (**self).get(key)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory preference store.
///
/// Values can be changed through a shared reference so a host (or a test) can
/// flip the flag while an arbiter holds the store.
#[derive(Default)]
pub struct MemoryPreferences {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryPreferences {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one entry.
    #[must_use]
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(key, value);
        store
    }

    /// Insert or replace a value. A poisoned lock leaves the store unchanged.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut guard) = self.values.write() {
            guard.insert(key.into(), value.into());
        }
    }

    pub fn remove(&self, key: &str) {
        if let Ok(mut guard) = self.values.write() {
            guard.remove(key);
        }
    }
}

impl PreferenceStore for MemoryPreferences {
    fn name(&self) -> &str {
        "MemoryPreferences"
    }

    fn get(&self, key: &str) -> PreferenceResult<Option<String>> {
        let guard = self
            .values
            .read()
            .map_err(|_| PreferenceError::Corruption("lock poisoned".into()))?;
        Ok(guard.get(key).cloned())
    }
}

impl fmt::Debug for MemoryPreferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.values.read().map(|g| g.len()).unwrap_or(0);
        f.debug_struct("MemoryPreferences")
            .field("entries", &count)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Environment
// ─────────────────────────────────────────────────────────────────────────────

/// Preference store backed by environment variables.
///
/// A key is looked up as `{prefix}{key}`. With an empty prefix the key is used
/// verbatim, so `SUPERSET_TERMINAL_IME_PUNCT=0` disables passthrough.
#[derive(Debug, Clone, Default)]
pub struct EnvPreferences {
    prefix: String,
}

impl EnvPreferences {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn var_name(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }
}

impl PreferenceStore for EnvPreferences {
    fn name(&self) -> &str {
        "EnvPreferences"
    }

    fn get(&self, key: &str) -> PreferenceResult<Option<String>> {
        match std::env::var(self.var_name(key)) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(PreferenceError::Corruption(format!(
                "{} is not valid unicode",
                self.var_name(key)
            ))),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File
// ─────────────────────────────────────────────────────────────────────────────

/// Preference store backed by a flat JSON object file.
///
/// ```json
/// { "SUPERSET_TERMINAL_IME_PUNCT": "0" }
/// ```
///
/// The file is read on every [`get`](PreferenceStore::get) so external edits
/// take effect immediately. A missing file means "no value". Non-string JSON
/// values are rendered with their JSON text (`0` reads as `"0"`).
#[derive(Debug, Clone)]
pub struct FilePreferences {
    path: PathBuf,
}

impl FilePreferences {
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferences {
    fn name(&self) -> &str {
        "FilePreferences"
    }

    fn get(&self, key: &str) -> PreferenceResult<Option<String>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&text)
            .map_err(|e| {
                PreferenceError::Corruption(format!("{}: {e}", self.path.display()))
            })?;
        Ok(map.get(key).map(|value| match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn memory_store_set_get_remove() {
        let store = MemoryPreferences::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v");
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k");
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn closure_store() {
        let store = FnPreferences(|key: &str| (key == "flag").then(|| "0".to_string()));
        assert_eq!(store.get("flag").unwrap().as_deref(), Some("0"));
        assert_eq!(store.get("other").unwrap(), None);
    }

    #[test]
    fn env_store_reads_prefixed_variable() {
        let store = EnvPreferences::with_prefix("TERMPUNCT_PREFS_TEST_");
        assert_eq!(store.get("SURELY_UNSET_KEY_42").unwrap(), None);
        let path = std::env::var("PATH").ok();
        let unprefixed = EnvPreferences::new();
        assert_eq!(unprefixed.get("PATH").unwrap(), path);
    }

    #[test]
    fn file_store_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePreferences::new(dir.path().join("prefs.json"));
        assert_eq!(store.get("anything").unwrap(), None);
    }

    #[test]
    fn file_store_reads_strings_and_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{"a": "0", "b": 0, "c": true}}"#).unwrap();
        drop(file);

        let store = FilePreferences::new(&path);
        assert_eq!(store.get("a").unwrap().as_deref(), Some("0"));
        assert_eq!(store.get("b").unwrap().as_deref(), Some("0"));
        assert_eq!(store.get("c").unwrap().as_deref(), Some("true"));
        assert_eq!(store.get("d").unwrap(), None);
    }

    #[test]
    fn file_store_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json").unwrap();
        let store = FilePreferences::new(&path);
        assert!(matches!(
            store.get("a"),
            Err(PreferenceError::Corruption(_))
        ));
    }
}
