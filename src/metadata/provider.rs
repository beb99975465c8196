//! Trait definition and types for content providers.
//!
//! This module defines the [`ContentProvider`] trait that every catalog
//! backend implements, along with the domain metadata types the
//! [`mapper`](super::mapper) produces from provider wire formats. The matcher
//! and orchestrator depend only on this trait, never on a concrete client.

use async_trait::async_trait;
use chrono::NaiveDate;
use reelmatch_common::{ContentKind, ExternalId, Fingerprint, Result};
use reelmatch_db::models::Credit;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Descriptive metadata for one piece of content, as resolved by a provider.
///
/// Search results and fingerprint hits carry partial metadata; a fetch by
/// external id carries everything the provider knows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Name of the provider that produced this (e.g. `"tmdb"`).
    pub provider: String,
    /// Provider-specific identifier.
    pub external_id: String,
    pub title: String,
    pub original_title: Option<String>,
    pub year: Option<i32>,
    pub release_date: Option<NaiveDate>,
    pub runtime_minutes: Option<i32>,
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub popularity: Option<f64>,
    pub budget: Option<i64>,
    pub revenue: Option<i64>,
    /// Full poster URL.
    pub poster_url: Option<String>,
    /// Full backdrop URL.
    pub backdrop_url: Option<String>,
    pub studio: Option<String>,
    /// Name of the collection this belongs to.
    pub collection: Option<String>,
    pub genres: Vec<String>,
    pub credits: Vec<Credit>,
    /// Identifiers in other catalogs (e.g. IMDb), besides the provider's own.
    pub external_ids: Vec<ExternalId>,
    /// Fingerprints the provider has on file for this content.
    pub fingerprints: Vec<Fingerprint>,
}

impl RecordMetadata {
    /// The provider's own identifier as an [`ExternalId`].
    pub fn provider_id(&self) -> ExternalId {
        ExternalId::new(&self.provider, &self.external_id)
    }
}

/// A person known to a provider (a performer, actor or crew member).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonMetadata {
    pub provider: String,
    pub external_id: String,
    pub name: String,
    pub disambiguation: Option<String>,
    pub aliases: Vec<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    pub country: Option<String>,
    pub image_url: Option<String>,
    pub scene_count: Option<i64>,
}

/// A named collection of related content (e.g. a film series).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionMetadata {
    pub provider: String,
    pub external_id: String,
    pub name: String,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    /// Members of the collection in release order.
    pub parts: Vec<RecordMetadata>,
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Async trait implemented by each catalog backend, one per content kind.
///
/// Errors follow the shared taxonomy: a missing item is
/// [`Error::NotFound`](reelmatch_common::Error::NotFound), and transport,
/// credential, throttling and body problems map to `Unavailable`,
/// `Unauthorized`, `RateLimited` and `Decode`.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Short, lowercase identifier for this provider (e.g. `"tmdb"`).
    fn name(&self) -> &'static str;

    /// The content kind this provider resolves.
    fn kind(&self) -> ContentKind;

    /// Returns `true` when the provider has credentials configured.
    fn is_available(&self) -> bool;

    /// Fetch full metadata for the provider's own identifier.
    async fn fetch_by_external_id(
        &self,
        external_id: &str,
        cancel: &CancellationToken,
    ) -> Result<RecordMetadata>;

    /// Look up content by fingerprint. Any returned candidate is a match.
    ///
    /// Providers without fingerprint support return no candidates.
    async fn match_by_fingerprints(
        &self,
        _fingerprints: &[Fingerprint],
        _cancel: &CancellationToken,
    ) -> Result<Vec<RecordMetadata>> {
        Ok(Vec::new())
    }

    /// Search by title with an optional year hint. Candidates come back in
    /// provider order.
    async fn match_by_heuristics(
        &self,
        title: &str,
        year: Option<i32>,
        cancel: &CancellationToken,
    ) -> Result<Vec<RecordMetadata>>;
}
