//! TMDB v3 REST client.
//!
//! Every request goes through the shared [`RateLimiter`] and the injected
//! [`Cache`]. A cache hit skips both the limiter and the network.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reelmatch_common::{Error, Result};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::types::{ApiError, Collection, Credits, Images, Movie, SearchResponse};
use crate::config::TmdbConfig;
use crate::metadata::cache::{cache_key, Cache, TtlCache};
use crate::metadata::http::{build_client, send_with_retry, RetryPolicy};
use crate::metadata::mapper;
use crate::metadata::rate_limit::RateLimiter;

/// Low-level TMDB client returning wire types.
///
/// # Examples
///
/// ```no_run
/// use reelmatch::config::TmdbConfig;
/// use reelmatch::metadata::providers::tmdb::TmdbClient;
///
/// let config = TmdbConfig {
///     api_key: "your-api-key".into(),
///     ..TmdbConfig::default()
/// };
/// let client = TmdbClient::new(&config).unwrap();
/// assert!(client.is_configured());
/// ```
pub struct TmdbClient {
    http: reqwest::Client,
    api_key: String,
    language: String,
    base_url: String,
    image_base_url: String,
    limiter: RateLimiter,
    cache: Arc<dyn Cache>,
    cache_ttl: Duration,
    search_cache_ttl: Duration,
    retry: RetryPolicy,
}

impl TmdbClient {
    /// Create a client with its own in-memory cache.
    pub fn new(config: &TmdbConfig) -> Result<Self> {
        Self::with_cache(config, Arc::new(TtlCache::new()))
    }

    /// Create a client backed by the given cache.
    pub fn with_cache(config: &TmdbConfig, cache: Arc<dyn Cache>) -> Result<Self> {
        Ok(Self {
            http: build_client(Duration::from_secs(config.timeout_secs))?,
            api_key: config.api_key.clone(),
            language: config.language.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            image_base_url: config.image_base_url.clone(),
            limiter: RateLimiter::new(config.rate_limit, config.burst)?,
            cache,
            cache_ttl: Duration::from_secs(config.cache_ttl_secs),
            search_cache_ttl: Duration::from_secs(config.search_cache_ttl_secs),
            retry: RetryPolicy {
                max_retries: config.max_retries,
                backoff: Duration::from_millis(config.retry_backoff_ms),
                retry_rate_limited: true,
            },
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub fn image_base_url(&self) -> &str {
        &self.image_base_url
    }

    /// Full image URL for a relative path, or `None` for an empty path.
    pub fn image_url(&self, size: &str, path: &str) -> Option<String> {
        mapper::image_url(&self.image_base_url, size, Some(path))
    }

    /// Search movies by title, optionally filtered by release year.
    pub async fn search_movies(
        &self,
        title: &str,
        year: Option<i32>,
        cancel: &CancellationToken,
    ) -> Result<SearchResponse> {
        let mut params = vec![
            ("query", title.to_string()),
            ("language", self.language.clone()),
            ("page", "1".to_string()),
        ];
        if let Some(year) = year {
            params.push(("year", year.to_string()));
        }
        self.get_json("/search/movie", params, self.search_cache_ttl, cancel)
            .await
    }

    pub async fn fetch_movie(&self, id: u64, cancel: &CancellationToken) -> Result<Movie> {
        self.get_json(
            &format!("/movie/{id}"),
            vec![("language", self.language.clone())],
            self.cache_ttl,
            cancel,
        )
        .await
    }

    pub async fn fetch_credits(&self, id: u64, cancel: &CancellationToken) -> Result<Credits> {
        self.get_json(
            &format!("/movie/{id}/credits"),
            vec![("language", self.language.clone())],
            self.cache_ttl,
            cancel,
        )
        .await
    }

    pub async fn fetch_images(&self, id: u64, cancel: &CancellationToken) -> Result<Images> {
        // Images are filtered by language tag; keep untagged artwork too.
        let lang = self.language.split('-').next().unwrap_or("en").to_string();
        self.get_json(
            &format!("/movie/{id}/images"),
            vec![("include_image_language", format!("{lang},null"))],
            self.cache_ttl,
            cancel,
        )
        .await
    }

    pub async fn fetch_collection(&self, id: u64, cancel: &CancellationToken) -> Result<Collection> {
        self.get_json(
            &format!("/collection/{id}"),
            vec![("language", self.language.clone())],
            self.cache_ttl,
            cancel,
        )
        .await
    }

    /// Download raw image bytes. Image downloads are rate limited but not
    /// cached.
    pub async fn download_image(
        &self,
        size: &str,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<Bytes> {
        let url = self
            .image_url(size, path)
            .ok_or_else(|| Error::validation("image path is empty"))?;

        let resp = send_with_retry("tmdb image", self.retry, Some(&self.limiter), cancel, || {
            self.http.get(&url)
        })
        .await?;
        let resp = classify(resp, &url).await?;

        resp.bytes()
            .await
            .map_err(|e| Error::Unavailable(format!("reading image body: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: Vec<(&'static str, String)>,
        ttl: Duration,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let key = cache_key(endpoint, &params);

        if let Some(payload) = self.cache.get(&key) {
            match serde_json::from_slice(&payload) {
                Ok(value) => {
                    debug!(key = %key, "TMDB cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Dropping undecodable cache entry");
                    self.cache.delete(&key);
                }
            }
        }

        let url = format!("{}{endpoint}", self.base_url);
        let mut query = params;
        query.push(("api_key", self.api_key.clone()));

        debug!(endpoint, "TMDB request");
        let resp = send_with_retry(endpoint, self.retry, Some(&self.limiter), cancel, || {
            self.http.get(&url).query(&query)
        })
        .await?;
        let resp = classify(resp, endpoint).await?;

        let payload = resp
            .bytes()
            .await
            .map_err(|e| Error::Unavailable(format!("reading {endpoint} body: {e}")))?;
        let value = serde_json::from_slice(&payload)
            .map_err(|e| Error::decode(format!("{endpoint}: {e}")))?;

        self.cache.set(&key, payload, ttl);
        Ok(value)
    }
}

impl std::fmt::Debug for TmdbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TmdbClient")
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .field("configured", &self.is_configured())
            .finish_non_exhaustive()
    }
}

/// Map a non-2xx response onto the error taxonomy.
async fn classify(resp: Response, what: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&body)
        .ok()
        .and_then(|e| e.status_message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Unauthorized(message),
        StatusCode::NOT_FOUND => Error::not_found("tmdb resource", what),
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited(message),
        _ => Error::api(status.as_u16(), message),
    })
}
