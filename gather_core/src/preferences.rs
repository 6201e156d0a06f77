use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Per-user provider enablement overrides.
///
/// Ids absent from the map follow their descriptor's default; see
/// [`SourceRegistry::is_enabled`](crate::federated::SourceRegistry::is_enabled).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserPreferences {
    enabled: BTreeMap<String, bool>,
}

impl UserPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit setting for `provider`, if any.
    pub fn get(&self, provider: &str) -> Option<bool> {
        self.enabled.get(provider).copied()
    }

    pub fn set(&mut self, provider: impl Into<String>, enabled: bool) {
        self.enabled.insert(provider.into(), enabled);
    }

    pub fn enable(&mut self, provider: impl Into<String>) {
        self.set(provider, true);
    }

    pub fn disable(&mut self, provider: impl Into<String>) {
        self.set(provider, false);
    }

    /// Drop the explicit setting, returning the provider to its default.
    pub fn reset(&mut self, provider: &str) -> bool {
        self.enabled.remove(provider).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.enabled.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, bool)> for UserPreferences {
    fn from_iter<T: IntoIterator<Item = (String, bool)>>(iter: T) -> Self {
        Self {
            enabled: iter.into_iter().collect(),
        }
    }
}

/// Persistence boundary for [`UserPreferences`].
///
/// The core only reads preferences (once per request); writes come from
/// explicit user action such as `gather disable <id>`.
pub trait PreferenceStore: Send + Sync {
    fn read(&self) -> Result<UserPreferences, StoreError>;
    fn write(&self, preferences: &UserPreferences) -> Result<(), StoreError>;
}

/// A simple in-memory store, mainly for testing.
pub struct MemoryPreferenceStore {
    prefs: std::sync::Mutex<UserPreferences>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::with(UserPreferences::default())
    }

    pub fn with(preferences: UserPreferences) -> Self {
        Self {
            prefs: std::sync::Mutex::new(preferences),
        }
    }
}

impl Default for MemoryPreferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn read(&self) -> Result<UserPreferences, StoreError> {
        self.prefs
            .lock()
            .map(|p| p.clone())
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))
    }

    fn write(&self, preferences: &UserPreferences) -> Result<(), StoreError> {
        *self
            .prefs
            .lock()
            .map_err(|e| StoreError::Persist(format!("lock poisoned: {}", e)))? =
            preferences.clone();
        Ok(())
    }
}

/// A file-backed JSON store at `~/.config/gather/preferences.json` (Unix)
/// or `%APPDATA%/gather/preferences.json` (Windows).
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new_default() -> Self {
        Self::new(crate::config::config_dir().join("preferences.json"))
    }

    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn read(&self) -> Result<UserPreferences, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(s) => serde_json::from_str(&s)
                .map_err(|e| StoreError::Unavailable(format!("corrupt preferences: {}", e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(UserPreferences::default()),
            Err(e) => Err(StoreError::Unavailable(e.to_string())),
        }
    }

    fn write(&self, preferences: &UserPreferences) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Persist(e.to_string()))?;
        }
        let s = serde_json::to_string_pretty(preferences)
            .map_err(|e| StoreError::Persist(format!("serde: {}", e)))?;
        std::fs::write(&self.path, s).map_err(|e| StoreError::Persist(e.to_string()))?;
        Ok(())
    }
}
