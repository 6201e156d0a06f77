//! Catalog of providers available to federated search.

use super::{Category, ProviderDescriptor};
use crate::error::RegistryError;
use crate::preferences::UserPreferences;
use crate::Provider;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// A provider together with its static descriptor.
#[derive(Clone)]
pub struct RegisteredProvider {
    pub descriptor: ProviderDescriptor,
    pub provider: Arc<dyn Provider>,
}

impl std::fmt::Debug for RegisteredProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredProvider")
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

/// Registration-ordered set of providers.
///
/// Registration order matters: the executor concatenates responses in this
/// order and deduplication keeps the first occurrence, so it decides which
/// provider wins when two return the same story.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    entries: Vec<RegisteredProvider>,
    index: HashMap<String, usize>,
    /// Lower-cased display name -> provider id
    display_names: HashMap<String, String>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        descriptor: ProviderDescriptor,
        provider: Arc<dyn Provider>,
    ) -> Result<(), RegistryError> {
        if self.index.contains_key(&descriptor.id) {
            return Err(RegistryError::DuplicateProvider(descriptor.id));
        }
        self.index.insert(descriptor.id.clone(), self.entries.len());
        self.display_names
            .entry(descriptor.display_name.to_lowercase())
            .or_insert_with(|| descriptor.id.clone());
        self.entries.push(RegisteredProvider {
            descriptor,
            provider,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&RegisteredProvider> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    pub fn descriptor(&self, id: &str) -> Option<&ProviderDescriptor> {
        self.get(id).map(|e| &e.descriptor)
    }

    /// Fail with `UnknownProvider` unless `id` is registered.
    pub fn require(&self, id: &str) -> Result<&ProviderDescriptor, RegistryError> {
        self.descriptor(id)
            .ok_or_else(|| RegistryError::UnknownProvider(id.to_string()))
    }

    /// All descriptors in registration order.
    pub fn all_providers(&self) -> Vec<&ProviderDescriptor> {
        self.entries.iter().map(|e| &e.descriptor).collect()
    }

    /// Whether `descriptor` is enabled under `preferences`.
    ///
    /// An explicit preference always wins; otherwise the descriptor's
    /// default applies.
    pub fn is_enabled(descriptor: &ProviderDescriptor, preferences: &UserPreferences) -> bool {
        preferences
            .get(&descriptor.id)
            .unwrap_or(descriptor.enabled_by_default)
    }

    pub fn enabled_provider_ids(&self, preferences: &UserPreferences) -> BTreeSet<String> {
        self.entries
            .iter()
            .filter(|e| Self::is_enabled(&e.descriptor, preferences))
            .map(|e| e.descriptor.id.clone())
            .collect()
    }

    pub fn disabled_provider_ids(&self, preferences: &UserPreferences) -> BTreeSet<String> {
        self.entries
            .iter()
            .filter(|e| !Self::is_enabled(&e.descriptor, preferences))
            .map(|e| e.descriptor.id.clone())
            .collect()
    }

    /// Providers to dispatch to, in registration order.
    pub fn enabled_providers(
        &self,
        preferences: &UserPreferences,
        category: Option<Category>,
    ) -> Vec<&RegisteredProvider> {
        self.entries
            .iter()
            .filter(|e| Self::is_enabled(&e.descriptor, preferences))
            .filter(|e| category.map_or(true, |c| e.descriptor.category == c))
            .collect()
    }

    pub fn by_category(&self, category: Category) -> Vec<&ProviderDescriptor> {
        self.entries
            .iter()
            .map(|e| &e.descriptor)
            .filter(|d| d.category == category)
            .collect()
    }

    /// Every category with its providers; categories without providers are
    /// present with an empty list.
    pub fn categories(&self) -> BTreeMap<Category, Vec<&ProviderDescriptor>> {
        let mut grouped: BTreeMap<Category, Vec<&ProviderDescriptor>> =
            Category::ALL.iter().map(|c| (*c, Vec::new())).collect();
        for entry in &self.entries {
            grouped
                .entry(entry.descriptor.category)
                .or_default()
                .push(&entry.descriptor);
        }
        grouped
    }

    pub fn category_of(&self, id: &str) -> Option<Category> {
        self.descriptor(id).map(|d| d.category)
    }

    /// Map a display source name back to its provider id.
    pub fn provider_id_for_source(&self, display_name: &str) -> Option<&str> {
        self.display_names
            .get(&display_name.trim().to_lowercase())
            .map(|s| s.as_str())
    }
}
