use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub tmdb: TmdbConfig,

    #[serde(default)]
    pub stashdb: StashDbConfig,

    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite database file
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("reelmatch.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Movie catalog (TMDB v3) client settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    /// API key sent as the `api_key` query parameter. Empty disables the provider.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_tmdb_base_url")]
    pub base_url: String,

    #[serde(default = "default_tmdb_image_base_url")]
    pub image_base_url: String,

    /// Steady-state requests per second
    #[serde(default = "default_rate_limit")]
    pub rate_limit: f64,

    /// Requests allowed in a burst above the steady rate
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// TTL for detail, credits, images and collection responses
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// TTL for search responses
    #[serde(default = "default_search_cache_ttl")]
    pub search_cache_ttl_secs: u64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

fn default_language() -> String {
    "en-US".to_string()
}
fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}
fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}
fn default_rate_limit() -> f64 {
    4.0
}
fn default_burst() -> u32 {
    10
}
fn default_cache_ttl() -> u64 {
    24 * 60 * 60
}
fn default_search_cache_ttl() -> u64 {
    15 * 60
}
fn default_timeout() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_backoff() -> u64 {
    1000
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language: default_language(),
            base_url: default_tmdb_base_url(),
            image_base_url: default_tmdb_image_base_url(),
            rate_limit: default_rate_limit(),
            burst: default_burst(),
            cache_ttl_secs: default_cache_ttl(),
            search_cache_ttl_secs: default_search_cache_ttl(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}

/// Scene catalog (StashDB GraphQL) client settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StashDbConfig {
    #[serde(default = "default_stashdb_endpoint")]
    pub endpoint: String,

    /// Sent in the `ApiKey` header. Empty disables the provider.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

fn default_stashdb_endpoint() -> String {
    "https://stashdb.org/graphql".to_string()
}

impl Default for StashDbConfig {
    fn default() -> Self {
        Self {
            endpoint: default_stashdb_endpoint(),
            api_key: String::new(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnrichmentConfig {
    /// Queue every newly created record for a background re-enrichment pass
    #[serde(default)]
    pub queue_new_records: bool,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_queue_capacity() -> usize {
    100
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            queue_new_records: false,
            queue_capacity: default_queue_capacity(),
        }
    }
}
