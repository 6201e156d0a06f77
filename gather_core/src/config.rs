//! Configuration for the aggregation core.
//!
//! Loaded from `~/.config/gather/config.toml`. Every field has a default, so
//! a missing file or a partial file is fine.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default cache time-to-live in seconds
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Default interval between background cache sweeps in seconds
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Profile used when the caller does not name one
pub const DEFAULT_PROFILE: &str = "standard";

/// Directory holding config, preferences and user profiles.
pub fn config_dir() -> PathBuf {
    let base = dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|p| p.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("gather")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_sweep_interval_secs() -> u64 {
    DEFAULT_SWEEP_INTERVAL_SECS
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        // A zero interval would make tokio's interval panic
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_profile")]
    pub default_profile: String,
}

fn default_profile() -> String {
    DEFAULT_PROFILE.to_string()
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_profile: DEFAULT_PROFILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatherConfig {
    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub search: SearchSettings,

    /// Override for the preferences file location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences_path: Option<PathBuf>,

    /// Override for the user profiles file location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiles_path: Option<PathBuf>,
}

impl GatherConfig {
    /// Default location of the config file.
    pub fn default_path() -> PathBuf {
        config_dir().join("config.toml")
    }

    /// Load from the default location, falling back to defaults if absent.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(&Self::default_path())
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.preferences_path
            .clone()
            .unwrap_or_else(|| config_dir().join("preferences.json"))
    }

    pub fn profiles_path(&self) -> PathBuf {
        self.profiles_path
            .clone()
            .unwrap_or_else(|| config_dir().join("profiles.yaml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatherConfig::default();
        assert_eq!(config.cache.ttl(), Duration::from_secs(300));
        assert_eq!(config.cache.sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.search.default_profile, "standard");
    }

    #[test]
    fn test_partial_toml() {
        let config = GatherConfig::from_toml(
            r#"
            [cache]
            ttl_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.cache.ttl_secs, 30);
        assert_eq!(config.cache.sweep_interval_secs, DEFAULT_SWEEP_INTERVAL_SECS);
        assert_eq!(config.search.default_profile, DEFAULT_PROFILE);
    }

    #[test]
    fn test_zero_sweep_interval_is_clamped() {
        let settings = CacheSettings {
            ttl_secs: 10,
            sweep_interval_secs: 0,
        };
        assert_eq!(settings.sweep_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = GatherConfig::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, GatherConfig::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = GatherConfig::default();
        config.search.default_profile = "mega".to_string();
        config.preferences_path = Some(PathBuf::from("/tmp/prefs.json"));

        let text = config.to_toml().unwrap();
        assert!(text.contains("default_profile = \"mega\""));
        assert_eq!(GatherConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_errors() {
        assert!(matches!(
            GatherConfig::from_toml("[cache\nttl_secs = "),
            Err(ConfigError::Toml(_))
        ));
    }
}
