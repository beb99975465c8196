//! Metadata matching and enrichment.
//!
//! # Module layout
//!
//! - [`provider`] -- The [`ContentProvider`] trait and domain metadata types.
//! - [`providers`] -- TMDB (movies, REST) and StashDB (scenes, GraphQL).
//! - [`cache`], [`rate_limit`], [`http`] -- Client plumbing shared by providers.
//! - [`mapper`] -- Pure conversion from wire types to domain metadata.
//! - [`registry`] -- Provider lookup by content kind or name.
//! - [`matcher`] -- Resolves a scanned file to a record.
//! - [`enrichment`] -- Library runs and single-record re-enrichment.
//! - [`queue`] -- Background re-enrichment queue.

pub mod cache;
pub mod enrichment;
pub mod http;
pub mod mapper;
pub mod matcher;
pub mod provider;
pub mod providers;
pub mod queue;
pub mod rate_limit;
pub mod registry;

use std::sync::Arc;

use reelmatch_common::Result;

use crate::config::Config;

pub use enrichment::{EnrichmentService, FileError, RunSummary};
pub use matcher::{IdentityMatcher, MatchOutcome};
pub use provider::{CollectionMetadata, ContentProvider, PersonMetadata, RecordMetadata};
pub use providers::{StashDbProvider, TmdbProvider};
pub use queue::{EnrichmentJob, EnrichmentQueue, JobEnqueuer, QueueWorker};
pub use registry::ProviderRegistry;

/// Register both catalogs from configuration. Providers without credentials
/// are still registered and report themselves unavailable.
pub fn build_registry(config: &Config) -> Result<ProviderRegistry> {
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(TmdbProvider::new(&config.tmdb)?));
    registry.register(Arc::new(StashDbProvider::new(&config.stashdb)?));
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelmatch_common::ContentKind;

    #[test]
    fn default_registry_serves_both_kinds() {
        let registry = build_registry(&Config::default()).unwrap();
        assert_eq!(registry.names(), vec!["tmdb", "stashdb"]);
        assert_eq!(registry.for_kind(ContentKind::Movie).unwrap().name(), "tmdb");
        assert_eq!(registry.for_kind(ContentKind::Scene).unwrap().name(), "stashdb");
        // No credentials configured
        assert!(registry.available().is_empty());
    }
}
