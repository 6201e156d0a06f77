//! Aggregation profile management.
//!
//! Profiles select the aggregation variant (how results are grouped for the
//! diversity cap, how many are returned) together with the fan-out timeouts.
//! Everything has sensible defaults.

use super::pipeline::{GroupBy, PipelineSettings};
use crate::config::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

// ============================================================================
// Default Values
// ============================================================================

/// Default results kept per diversity group
pub const DEFAULT_PER_GROUP_CAP: usize = 2;

/// Default maximum number of returned results
pub const DEFAULT_MAX_RESULTS: usize = 20;

/// Below this many distinct results the fallback generator tops up
pub const DEFAULT_MIN_RESULTS: usize = 5;

/// Default per-provider timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 8000;

/// Default fan-out deadline in milliseconds
pub const DEFAULT_GLOBAL_TIMEOUT_MS: u64 = 15000;

// ============================================================================
// AggregationProfile
// ============================================================================

/// A named aggregation profile.
///
/// Profiles can be:
/// - Built-in (`standard`, `mega`, `focused`)
/// - User-defined (in ~/.config/gather/profiles.yaml), shadowing built-ins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationProfile {
    /// Profile name; filled from the map key for user profiles
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Diversity grouping (default: source)
    #[serde(default)]
    pub group_by: GroupBy,

    /// Results kept per group (default: 2)
    #[serde(default = "default_per_group_cap")]
    pub per_group_cap: usize,

    /// Maximum results returned (default: 20)
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Fallback floor (default: 5)
    #[serde(default = "default_min_results")]
    pub min_results: usize,

    /// Per-provider timeout in milliseconds (default: 8000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Fan-out deadline in milliseconds (default: 15000)
    #[serde(default = "default_global_timeout_ms")]
    pub global_timeout_ms: u64,
}

fn default_per_group_cap() -> usize {
    DEFAULT_PER_GROUP_CAP
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

fn default_min_results() -> usize {
    DEFAULT_MIN_RESULTS
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_global_timeout_ms() -> u64 {
    DEFAULT_GLOBAL_TIMEOUT_MS
}

impl AggregationProfile {
    /// Create a profile with default parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            group_by: GroupBy::Source,
            per_group_cap: DEFAULT_PER_GROUP_CAP,
            max_results: DEFAULT_MAX_RESULTS,
            min_results: DEFAULT_MIN_RESULTS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            global_timeout_ms: DEFAULT_GLOBAL_TIMEOUT_MS,
        }
    }

    /// Get a built-in profile by name.
    pub fn get_builtin(name: &str) -> Option<Self> {
        BUILTIN_PROFILES.iter().find(|p| p.name == name).cloned()
    }

    /// List all built-in profiles.
    pub fn list_builtin() -> &'static [AggregationProfile] {
        &BUILTIN_PROFILES
    }

    pub fn is_builtin(&self) -> bool {
        BUILTIN_PROFILES.iter().any(|p| p.name == self.name)
    }

    pub fn per_call_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn fan_out_deadline(&self) -> Duration {
        Duration::from_millis(self.global_timeout_ms)
    }

    /// Pipeline settings for one request. `limit` further caps the maximum.
    pub fn pipeline_settings(&self, limit: Option<usize>) -> PipelineSettings {
        let max_results = limit.map_or(self.max_results, |l| l.min(self.max_results));
        PipelineSettings {
            group_by: self.group_by,
            per_group_cap: self.per_group_cap.max(1),
            max_results,
        }
    }
}

// ============================================================================
// Built-in Profiles
// ============================================================================

/// Built-in profiles shipped with Gather.
static BUILTIN_PROFILES: Lazy<Vec<AggregationProfile>> = Lazy::new(|| {
    vec![
        AggregationProfile {
            description: Some("Balanced results across all enabled sources".to_string()),
            ..AggregationProfile::new("standard")
        },
        AggregationProfile {
            description: Some("Cross-domain aggregation, diversified by category".to_string()),
            group_by: GroupBy::Category,
            max_results: 25,
            ..AggregationProfile::new("mega")
        },
        AggregationProfile {
            description: Some("A shorter list for quick scans".to_string()),
            max_results: 15,
            ..AggregationProfile::new("focused")
        },
    ]
});

// ============================================================================
// ProfileStore
// ============================================================================

/// Storage for user-defined profiles.
///
/// Profiles are stored in YAML format at `~/.config/gather/profiles.yaml`,
/// as a map from profile name to profile.
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    /// Create a new profile store at the default location.
    pub fn new_default() -> Self {
        Self {
            path: config_dir().join("profiles.yaml"),
        }
    }

    /// Create a profile store at a custom path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Get the path to the profiles file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load all user-defined profiles. A missing or unreadable file yields
    /// no profiles.
    pub fn load_all(&self) -> HashMap<String, AggregationProfile> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return HashMap::new(),
        };
        match serde_yaml::from_str::<HashMap<String, AggregationProfile>>(&content) {
            Ok(mut profiles) => {
                for (name, profile) in profiles.iter_mut() {
                    profile.name = name.clone();
                }
                profiles
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring malformed profiles file");
                HashMap::new()
            }
        }
    }

    /// Load a specific profile by name.
    ///
    /// Resolution order:
    /// 1. User profiles (from file)
    /// 2. Built-in profiles
    pub fn load(&self, name: &str) -> Option<AggregationProfile> {
        if let Some(profile) = self.load_all().remove(name) {
            return Some(profile);
        }
        AggregationProfile::get_builtin(name)
    }

    /// Save a profile.
    pub fn save(&self, profile: &AggregationProfile) -> Result<(), ProfileStoreError> {
        let mut profiles = self.load_all();
        profiles.insert(profile.name.clone(), profile.clone());
        self.write_all(&profiles)
    }

    /// Delete a user profile.
    ///
    /// Returns `Ok(true)` if deleted, `Ok(false)` if not found.
    /// Built-in profiles cannot be deleted.
    pub fn delete(&self, name: &str) -> Result<bool, ProfileStoreError> {
        let mut profiles = self.load_all();
        let existed = profiles.remove(name).is_some();
        if existed {
            self.write_all(&profiles)?;
        }
        Ok(existed)
    }

    /// List all available profiles (user + built-in), sorted by name.
    pub fn list_all(&self) -> Vec<AggregationProfile> {
        let mut profiles: Vec<AggregationProfile> = self.load_all().into_values().collect();

        for builtin in AggregationProfile::list_builtin() {
            if !profiles.iter().any(|p| p.name == builtin.name) {
                profiles.push(builtin.clone());
            }
        }

        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        profiles
    }

    /// List only built-in profile names.
    pub fn list_builtin_names() -> Vec<&'static str> {
        BUILTIN_PROFILES.iter().map(|p| p.name.as_str()).collect()
    }

    fn write_all(
        &self,
        profiles: &HashMap<String, AggregationProfile>,
    ) -> Result<(), ProfileStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ProfileStoreError::Io(e.to_string()))?;
        }

        let content = serde_yaml::to_string(profiles)
            .map_err(|e| ProfileStoreError::Serialize(e.to_string()))?;

        std::fs::write(&self.path, content).map_err(|e| ProfileStoreError::Io(e.to_string()))?;

        Ok(())
    }
}

impl Default for ProfileStore {
    fn default() -> Self {
        Self::new_default()
    }
}

/// Errors from profile storage operations.
#[derive(Debug, thiserror::Error)]
pub enum ProfileStoreError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialize(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles() {
        let standard = AggregationProfile::get_builtin("standard").unwrap();
        assert_eq!(standard.group_by, GroupBy::Source);
        assert_eq!(standard.max_results, 20);
        assert_eq!(standard.min_results, DEFAULT_MIN_RESULTS);

        let mega = AggregationProfile::get_builtin("mega").unwrap();
        assert_eq!(mega.group_by, GroupBy::Category);
        assert_eq!(mega.max_results, 25);

        let focused = AggregationProfile::get_builtin("focused").unwrap();
        assert_eq!(focused.max_results, 15);
        assert_eq!(focused.per_group_cap, 2);
    }

    #[test]
    fn test_builtin_names() {
        assert_eq!(
            ProfileStore::list_builtin_names(),
            vec!["standard", "mega", "focused"]
        );
        assert!(AggregationProfile::get_builtin("nope").is_none());
    }

    #[test]
    fn test_pipeline_settings_respect_limit() {
        let profile = AggregationProfile::get_builtin("mega").unwrap();
        assert_eq!(profile.pipeline_settings(None).max_results, 25);
        assert_eq!(profile.pipeline_settings(Some(7)).max_results, 7);
        assert_eq!(profile.pipeline_settings(Some(100)).max_results, 25);
        assert_eq!(profile.pipeline_settings(None).group_by, GroupBy::Category);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "group_by: category\nmax_results: 30\n";
        let parsed: AggregationProfile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed.group_by, GroupBy::Category);
        assert_eq!(parsed.max_results, 30);
        assert_eq!(parsed.per_group_cap, DEFAULT_PER_GROUP_CAP);
        assert_eq!(parsed.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn test_store_round_trip_and_shadowing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("nested").join("profiles.yaml"));
        assert!(store.load_all().is_empty());

        let mut custom = AggregationProfile::new("standard");
        custom.max_results = 8;
        store.save(&custom).unwrap();
        store.save(&AggregationProfile::new("night-desk")).unwrap();

        assert_eq!(store.load("standard").unwrap().max_results, 8);
        assert_eq!(store.load("mega").unwrap().max_results, 25);
        assert!(store.load("night-desk").is_some());

        let names: Vec<_> = store.list_all().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["focused", "mega", "night-desk", "standard"]);

        assert!(store.delete("standard").unwrap());
        assert!(!store.delete("standard").unwrap());
        assert_eq!(store.load("standard").unwrap().max_results, 20);
    }

    #[test]
    fn test_malformed_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.yaml");
        std::fs::write(&path, "- not: [a, map").unwrap();
        let store = ProfileStore::new(path);
        assert!(store.load_all().is_empty());
        assert!(store.load("standard").is_some());
    }
}
