pub mod config;
pub mod profiles;
pub mod search;
pub mod sources;

use gather_core::config::GatherConfig;
use gather_core::error::{ConfigError, RegistryError, StoreError};
use gather_core::federated::{AggregationProfile, ProfileStore, ProfileStoreError, SourceRegistry};
use gather_core::preferences::FilePreferenceStore;
use gather_core::providers::default_registry;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown profile '{0}'. Run `gather profiles` to list them")]
    UnknownProfile(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Registry(#[from] RegistryError),

    #[error("Preferences error: {0}")]
    Store(#[from] StoreError),

    #[error("Profile store error: {0}")]
    ProfileStore(#[from] ProfileStoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, CommandError>;

/// Everything a command needs, loaded from the user's config directory.
pub struct Context {
    pub config_path: PathBuf,
    pub config: GatherConfig,
    pub registry: Arc<SourceRegistry>,
    pub preferences: Arc<FilePreferenceStore>,
    pub profiles: ProfileStore,
}

impl Context {
    pub fn load() -> Result<Self> {
        let config_path = GatherConfig::default_path();
        let config = GatherConfig::load(&config_path)?;
        Self::from_config(config_path, config)
    }

    pub fn from_config(config_path: PathBuf, config: GatherConfig) -> Result<Self> {
        let registry = Arc::new(default_registry()?);
        let preferences = Arc::new(FilePreferenceStore::new(config.preferences_path()));
        let profiles = ProfileStore::new(config.profiles_path());
        Ok(Self {
            config_path,
            config,
            registry,
            preferences,
            profiles,
        })
    }

    /// Resolve a profile by name, or the configured default when `None`.
    /// User profiles shadow built-ins of the same name.
    pub fn resolve_profile(&self, name: Option<&str>) -> Result<AggregationProfile> {
        let name = name.unwrap_or(&self.config.search.default_profile);
        self.profiles
            .load(name)
            .ok_or_else(|| CommandError::UnknownProfile(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(dir: &std::path::Path) -> Context {
        let config = GatherConfig {
            preferences_path: Some(dir.join("preferences.json")),
            profiles_path: Some(dir.join("profiles.yaml")),
            ..GatherConfig::default()
        };
        Context::from_config(dir.join("config.toml"), config).unwrap()
    }

    #[test]
    fn test_resolve_profile() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        assert_eq!(ctx.resolve_profile(None).unwrap().name, "standard");
        assert_eq!(ctx.resolve_profile(Some("mega")).unwrap().name, "mega");
        assert!(matches!(
            ctx.resolve_profile(Some("nope")),
            Err(CommandError::UnknownProfile(_))
        ));
    }

    #[test]
    fn test_user_profile_shadows_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let mut custom = AggregationProfile::new("focused");
        custom.max_results = 3;
        ctx.profiles.save(&custom).unwrap();

        assert_eq!(ctx.resolve_profile(Some("focused")).unwrap().max_results, 3);
    }
}
