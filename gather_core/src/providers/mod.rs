//! Bundled providers and the default catalog.

pub mod hackernews;
pub mod template;
pub mod wikipedia;

pub use hackernews::HackerNewsProvider;
pub use template::{Desk, TemplateProvider};
pub use wikipedia::WikipediaProvider;

use crate::error::RegistryError;
use crate::federated::{Category, ProviderDescriptor, SourceRegistry};
use std::sync::Arc;
use tracing::warn;

const fn desk(
    id: &'static str,
    name: &'static str,
    category: Category,
    viewpoint: &'static str,
) -> Desk {
    Desk {
        id,
        name,
        category,
        viewpoint,
        enabled_by_default: true,
    }
}

/// Offline desks, in registration order.
pub const DESKS: &[Desk] = &[
    desk("morning-wire", "Morning Wire", Category::News, "center"),
    desk("evening-bulletin", "Evening Bulletin", Category::News, "center-left"),
    desk("byte-report", "Byte Report", Category::Technology, "center"),
    desk("journal-review", "Journal Review", Category::Academic, "academic"),
    desk("market-ledger", "Market Ledger", Category::Business, "center-right"),
    desk("boardroom-brief", "Boardroom Brief", Category::Business, "right"),
    desk("town-square", "Town Square", Category::Social, "mixed"),
    desk("forum-digest", "Forum Digest", Category::Social, "mixed"),
    desk("final-whistle", "Final Whistle", Category::Sports, "neutral"),
    desk("box-score", "Box Score", Category::Sports, "neutral"),
    desk("marquee", "Marquee", Category::Entertainment, "center"),
    Desk {
        enabled_by_default: false,
        ..desk("gossip-column", "Gossip Column", Category::Entertainment, "tabloid")
    },
    desk("capitol-notes", "Capitol Notes", Category::Government, "center-left"),
    desk("public-record", "Public Record", Category::Government, "official"),
    desk("vital-signs", "Vital Signs", Category::Health, "center"),
    desk("wellness-weekly", "Wellness Weekly", Category::Health, "center"),
    desk("metro-beat", "Metro Beat", Category::Local, "center-left"),
    desk("neighborhood-voice", "Neighborhood Voice", Category::Local, "community"),
    desk("global-dispatch", "Global Dispatch", Category::International, "center"),
    desk("across-borders", "Across Borders", Category::International, "left"),
];

/// Register every offline desk.
pub fn register_desks(registry: &mut SourceRegistry) -> Result<(), RegistryError> {
    for d in DESKS {
        let mut descriptor = ProviderDescriptor::new(d.id, d.name, d.category);
        descriptor.enabled_by_default = d.enabled_by_default;
        registry.register(descriptor, Arc::new(TemplateProvider::new(*d)))?;
    }
    Ok(())
}

/// The catalog shipped with the CLI: the network providers followed by the
/// offline desks.
pub fn default_registry() -> Result<SourceRegistry, RegistryError> {
    let mut registry = SourceRegistry::new();
    registry.register(
        HackerNewsProvider::descriptor(),
        Arc::new(HackerNewsProvider::new()),
    )?;
    match WikipediaProvider::new("en") {
        Ok(provider) => registry.register(WikipediaProvider::descriptor(), Arc::new(provider))?,
        Err(e) => warn!(error = %e, "Wikipedia provider unavailable"),
    }
    register_desks(&mut registry)?;
    Ok(registry)
}

/// Registry of offline desks only.
pub fn offline_registry() -> Result<SourceRegistry, RegistryError> {
    let mut registry = SourceRegistry::new();
    register_desks(&mut registry)?;
    Ok(registry)
}
