//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] (in-memory database plus a temporary library
//! root), [`ScriptedProvider`] (a [`ContentProvider`] whose answers are set
//! per test) and config helpers pointing the real clients at a mock server.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use reelmatch::config::{StashDbConfig, TmdbConfig};
use reelmatch::metadata::{ContentProvider, EnrichmentService, ProviderRegistry, RecordMetadata};
use reelmatch::repository::SqliteRepository;
use reelmatch_common::{ContentKind, Fingerprint, Result};
use reelmatch_db::models::Library;
use reelmatch_db::pool::init_memory_pool;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// In-memory repository plus a temporary directory to use as a library root.
pub struct TestHarness {
    pub repo: Arc<SqliteRepository>,
    pub root: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        let pool = init_memory_pool().expect("failed to create in-memory pool");
        Self {
            repo: Arc::new(SqliteRepository::new(pool)),
            root: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Create a library rooted at the harness directory.
    pub fn library(&self, kind: ContentKind) -> Library {
        self.repo
            .create_library(
                "Test Library",
                kind,
                &[self.root().to_string_lossy().into_owned()],
            )
            .expect("failed to create library")
    }

    /// Write a small file under the library root, creating parent dirs.
    pub fn touch(&self, relative: &str) -> PathBuf {
        let path = self.root().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"not really a video").unwrap();
        path
    }

    /// An orchestrator with `provider` as the only registered provider.
    pub fn service(&self, provider: Arc<dyn ContentProvider>) -> EnrichmentService {
        let mut registry = ProviderRegistry::new();
        registry.register(provider);
        EnrichmentService::new(self.repo.clone(), registry)
    }
}

type SearchFn = dyn Fn(&str, Option<i32>) -> Result<Vec<RecordMetadata>> + Send + Sync;
type FingerprintFn = dyn Fn(&[Fingerprint]) -> Result<Vec<RecordMetadata>> + Send + Sync;
type FetchFn = dyn Fn(&str) -> Result<RecordMetadata> + Send + Sync;

/// Provider whose answers come from closures, with call counters.
pub struct ScriptedProvider {
    kind: ContentKind,
    search: Box<SearchFn>,
    fingerprints: Box<FingerprintFn>,
    fetch: Box<FetchFn>,
    pub search_calls: AtomicUsize,
    pub fingerprint_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
}

impl ScriptedProvider {
    /// A provider that finds nothing anywhere.
    pub fn new(kind: ContentKind) -> Self {
        Self {
            kind,
            search: Box::new(|_, _| Ok(Vec::new())),
            fingerprints: Box::new(|_| Ok(Vec::new())),
            fetch: Box::new(|id| Err(reelmatch_common::Error::not_found("stub entry", id))),
            search_calls: AtomicUsize::new(0),
            fingerprint_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn on_search(
        mut self,
        f: impl Fn(&str, Option<i32>) -> Result<Vec<RecordMetadata>> + Send + Sync + 'static,
    ) -> Self {
        self.search = Box::new(f);
        self
    }

    pub fn on_fingerprints(
        mut self,
        f: impl Fn(&[Fingerprint]) -> Result<Vec<RecordMetadata>> + Send + Sync + 'static,
    ) -> Self {
        self.fingerprints = Box::new(f);
        self
    }

    pub fn on_fetch(
        mut self,
        f: impl Fn(&str) -> Result<RecordMetadata> + Send + Sync + 'static,
    ) -> Self {
        self.fetch = Box::new(f);
        self
    }

    pub fn searches(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn fingerprint_queries(&self) -> usize {
        self.fingerprint_calls.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn kind(&self) -> ContentKind {
        self.kind
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn fetch_by_external_id(
        &self,
        external_id: &str,
        _cancel: &CancellationToken,
    ) -> Result<RecordMetadata> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        (self.fetch)(external_id)
    }

    async fn match_by_fingerprints(
        &self,
        fingerprints: &[Fingerprint],
        _cancel: &CancellationToken,
    ) -> Result<Vec<RecordMetadata>> {
        self.fingerprint_calls.fetch_add(1, Ordering::SeqCst);
        (self.fingerprints)(fingerprints)
    }

    async fn match_by_heuristics(
        &self,
        title: &str,
        year: Option<i32>,
        _cancel: &CancellationToken,
    ) -> Result<Vec<RecordMetadata>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        (self.search)(title, year)
    }
}

/// A search-level candidate from the scripted provider.
pub fn candidate(id: &str, title: &str, year: Option<i32>) -> RecordMetadata {
    RecordMetadata {
        provider: "scripted".into(),
        external_id: id.into(),
        title: title.into(),
        year,
        ..Default::default()
    }
}

/// TMDB settings aimed at a mock server, with fast retries.
pub fn tmdb_config(base_url: &str) -> TmdbConfig {
    TmdbConfig {
        api_key: "test-key".into(),
        base_url: base_url.into(),
        image_base_url: format!("{base_url}/t/p"),
        rate_limit: 100.0,
        burst: 100,
        max_retries: 1,
        retry_backoff_ms: 10,
        timeout_secs: 5,
        ..TmdbConfig::default()
    }
}

/// StashDB settings aimed at a mock server.
pub fn stashdb_config(endpoint: &str) -> StashDbConfig {
    StashDbConfig {
        endpoint: endpoint.into(),
        api_key: "stash-key".into(),
        max_retries: 0,
        retry_backoff_ms: 10,
        timeout_secs: 5,
    }
}
