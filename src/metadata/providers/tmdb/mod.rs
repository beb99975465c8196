//! TMDB (The Movie Database) content provider.
//!
//! [`TmdbClient`] speaks the v3 REST API with a token-bucket rate limit, a
//! TTL response cache and bounded retries. [`TmdbProvider`] adapts it to
//! [`ContentProvider`] for movie libraries.

pub mod client;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use reelmatch_common::{ContentKind, Error, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub use client::TmdbClient;

use crate::metadata::mapper;
use crate::metadata::provider::{CollectionMetadata, ContentProvider, RecordMetadata};

/// Provider name stored in external ids.
pub const PROVIDER_NAME: &str = "tmdb";
/// Cross-reference provider name for IMDb ids found on TMDB movies.
pub const IMDB_PROVIDER: &str = "imdb";

/// Movie provider backed by TMDB.
///
/// # Examples
///
/// ```no_run
/// use reelmatch::config::TmdbConfig;
/// use reelmatch::metadata::providers::TmdbProvider;
///
/// let provider = TmdbProvider::new(&TmdbConfig::default()).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct TmdbProvider {
    client: Arc<TmdbClient>,
}

impl TmdbProvider {
    pub fn new(config: &crate::config::TmdbConfig) -> Result<Self> {
        Ok(Self::from_client(Arc::new(TmdbClient::new(config)?)))
    }

    pub fn from_client(client: Arc<TmdbClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &TmdbClient {
        &self.client
    }

    /// Fetch a collection with its parts.
    pub async fn fetch_collection(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<CollectionMetadata> {
        let id = parse_id(id)?;
        let collection = self.client.fetch_collection(id, cancel).await?;
        Ok(mapper::map_collection(&collection, self.client.image_base_url()))
    }
}

fn parse_id(id: &str) -> Result<u64> {
    id.trim()
        .parse()
        .map_err(|_| Error::validation(format!("invalid TMDB id: {id:?}")))
}

/// Errors that must never be swallowed by a best-effort sub-request.
fn is_fatal(err: &Error) -> bool {
    err.is_cancelled()
}

#[async_trait]
impl ContentProvider for TmdbProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn kind(&self) -> ContentKind {
        ContentKind::Movie
    }

    fn is_available(&self) -> bool {
        self.client.is_configured()
    }

    /// Movie detail plus credits. When the detail has no poster, the
    /// best-voted poster from the image list is used. Credits and images are
    /// best effort.
    async fn fetch_by_external_id(
        &self,
        external_id: &str,
        cancel: &CancellationToken,
    ) -> Result<RecordMetadata> {
        let id = parse_id(external_id)?;
        let base = self.client.image_base_url();

        let movie = self.client.fetch_movie(id, cancel).await?;
        let mut metadata = mapper::map_movie(&movie, base);

        match self.client.fetch_credits(id, cancel).await {
            Ok(credits) => metadata.credits = mapper::map_credits(&credits, base),
            Err(e) if is_fatal(&e) => return Err(e),
            Err(e) => warn!(tmdb_id = id, error = %e, "Failed to fetch credits"),
        }

        if metadata.poster_url.is_none() {
            match self.client.fetch_images(id, cancel).await {
                Ok(images) => {
                    metadata.poster_url = mapper::poster_url(base, mapper::best_poster(&images));
                }
                Err(e) if is_fatal(&e) => return Err(e),
                Err(e) => warn!(tmdb_id = id, error = %e, "Failed to fetch images"),
            }
        }

        Ok(metadata)
    }

    /// Title search with the year as a filter. If the filtered search finds
    /// nothing, the title alone is searched.
    async fn match_by_heuristics(
        &self,
        title: &str,
        year: Option<i32>,
        cancel: &CancellationToken,
    ) -> Result<Vec<RecordMetadata>> {
        let mut response = self.client.search_movies(title, year, cancel).await?;
        if response.results.is_empty() && year.is_some() {
            debug!(title, ?year, "No results with year, searching title only");
            response = self.client.search_movies(title, None, cancel).await?;
        }

        let base = self.client.image_base_url();
        Ok(response
            .results
            .iter()
            .map(|r| mapper::map_search_result(r, base))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TmdbConfig;

    #[test]
    fn provider_identity() {
        let provider = TmdbProvider::new(&TmdbConfig::default()).unwrap();
        assert_eq!(provider.name(), "tmdb");
        assert_eq!(provider.kind(), ContentKind::Movie);
        assert!(!provider.is_available());
    }

    #[tokio::test]
    async fn non_numeric_id_is_validation_error() {
        let provider = TmdbProvider::new(&TmdbConfig::default()).unwrap();
        let err = provider
            .fetch_by_external_id("tt0133093", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
