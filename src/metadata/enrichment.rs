//! Enrichment orchestration.
//!
//! The [`EnrichmentService`] runs a library end to end: scan the library's
//! roots, match every file through the [`IdentityMatcher`], persist new
//! records and their files, and collect a [`RunSummary`]. A failing file is
//! recorded in the summary and the run moves on; only a scan failure (or
//! cancellation) ends the run without a summary.
//!
//! It also owns [`re_enrich`](EnrichmentService::re_enrich), which refreshes
//! one existing record from the provider its external id points at.
//!
//! # Example
//!
//! ```rust,ignore
//! let service = EnrichmentService::new(repo, registry);
//! let summary = service.run_library(library_id, &cancel).await?;
//! println!("{} matched, {} errors", summary.matched, summary.errors.len());
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashSet;
use reelmatch_common::paths::container_from_path;
use reelmatch_common::{Error, FileRecordId, LibraryId, RecordId, Result};
use reelmatch_db::models::{CanonicalRecord, FileRecord, Library};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::mapper;
use super::matcher::{IdentityMatcher, MatchOutcome};
use super::provider::{ContentProvider, RecordMetadata};
use super::queue::{EnrichmentJob, JobEnqueuer};
use super::registry::ProviderRegistry;
use crate::repository::Repository;
use crate::scanner::{PathScanner, ScanResult};

/// One file that could not be matched or persisted.
#[derive(Debug)]
pub struct FileError {
    pub path: PathBuf,
    pub error: Error,
}

/// Outcome of one library run.
#[derive(Debug)]
pub struct RunSummary {
    pub library_id: LibraryId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_files: usize,
    /// Files resolved to a record, new or existing.
    pub matched: usize,
    pub unmatched: usize,
    /// Records created during this run.
    pub created: usize,
    /// Existing records touched during this run.
    pub existing: usize,
    /// Per-file failures, in scan order.
    pub errors: Vec<FileError>,
}

impl RunSummary {
    fn start(library_id: LibraryId) -> Self {
        let now = Utc::now();
        Self {
            library_id,
            started_at: now,
            finished_at: now,
            total_files: 0,
            matched: 0,
            unmatched: 0,
            created: 0,
            existing: 0,
            errors: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Drives scan, match and persist for libraries, and re-enrichment of single
/// records.
pub struct EnrichmentService {
    repo: Arc<dyn Repository>,
    registry: ProviderRegistry,
    matcher: IdentityMatcher,
    scanner: PathScanner,
    enqueuer: Option<Arc<dyn JobEnqueuer>>,
    active_runs: DashSet<LibraryId>,
}

impl EnrichmentService {
    pub fn new(repo: Arc<dyn Repository>, registry: ProviderRegistry) -> Self {
        Self {
            matcher: IdentityMatcher::new(repo.clone()),
            repo,
            registry,
            scanner: PathScanner::new(),
            enqueuer: None,
            active_runs: DashSet::new(),
        }
    }

    /// Queue every newly created record for a full re-enrichment.
    #[must_use]
    pub fn with_enqueuer(mut self, enqueuer: Arc<dyn JobEnqueuer>) -> Self {
        self.enqueuer = Some(enqueuer);
        self
    }

    #[must_use]
    pub fn with_scanner(mut self, scanner: PathScanner) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Whether a run for `library_id` is in progress.
    pub fn is_running(&self, library_id: LibraryId) -> bool {
        self.active_runs.contains(&library_id)
    }

    /// Scan and match every file in a library.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the library does not exist.
    /// - `Validation` if no provider serves the library's content kind.
    /// - `Conflict` if a run for this library is already in progress.
    /// - `ScanIo` if walking any root fails. No summary is produced.
    /// - `Cancelled` if `cancel` fires before the run completes.
    pub async fn run_library(
        &self,
        library_id: LibraryId,
        cancel: &CancellationToken,
    ) -> Result<RunSummary> {
        let library = self
            .repo
            .get_library(library_id)?
            .ok_or_else(|| Error::not_found("library", library_id))?;
        let provider = self.registry.require_kind(library.kind)?;
        let _guard = RunGuard::acquire(&self.active_runs, library_id)?;

        info!(
            library_id = %library_id,
            library = %library.name,
            provider = provider.name(),
            "Starting enrichment run"
        );
        let mut summary = RunSummary::start(library_id);

        let files = self.scan(&library, cancel).await?;
        summary.total_files = files.len();

        for scan in &files {
            if cancel.is_cancelled() {
                info!(library_id = %library_id, "Enrichment run cancelled");
                return Err(Error::Cancelled);
            }
            if let Some(reason) = &scan.scan_error {
                debug!(path = %scan.path.display(), reason = %reason, "Scan flagged file");
            }

            let outcome = self
                .matcher
                .match_file(library.id, provider.as_ref(), scan, cancel)
                .await;
            debug!(path = %scan.path.display(), outcome = outcome.label(), "Matched file");

            match outcome {
                MatchOutcome::MatchedNew(metadata) => {
                    match self.persist_new(&library, scan, &metadata) {
                        Ok(record) => {
                            summary.matched += 1;
                            summary.created += 1;
                            self.enqueue(&record);
                        }
                        Err(error) => self.record_error(&mut summary, scan, error),
                    }
                }
                MatchOutcome::MatchedExisting(record) => {
                    match self.touch_existing(&library, scan, *record) {
                        Ok(()) => {
                            summary.matched += 1;
                            summary.existing += 1;
                        }
                        Err(error) => self.record_error(&mut summary, scan, error),
                    }
                }
                MatchOutcome::Unmatched => summary.unmatched += 1,
                MatchOutcome::Errored(error) if error.is_cancelled() => {
                    return Err(Error::Cancelled);
                }
                MatchOutcome::Errored(error) => self.record_error(&mut summary, scan, error),
            }
        }

        summary.finished_at = Utc::now();
        info!(
            library_id = %library_id,
            total = summary.total_files,
            matched = summary.matched,
            unmatched = summary.unmatched,
            created = summary.created,
            existing = summary.existing,
            errors = summary.errors.len(),
            "Enrichment run complete"
        );
        Ok(summary)
    }

    /// Refresh one record from the provider named by its external id.
    ///
    /// The first external id whose provider is registered is used. A record
    /// without one is rejected with `Validation` before any request is made.
    pub async fn re_enrich(
        &self,
        record_id: RecordId,
        cancel: &CancellationToken,
    ) -> Result<CanonicalRecord> {
        let mut record = self
            .repo
            .get_record(record_id)?
            .ok_or_else(|| Error::not_found("record", record_id))?;

        let (provider, external_id) = self.provider_for(&record)?;
        info!(
            record_id = %record_id,
            provider = provider.name(),
            external_id = %external_id,
            "Re-enriching record"
        );

        let metadata = provider.fetch_by_external_id(&external_id, cancel).await?;
        mapper::apply_to_record(&mut record, &metadata);
        self.repo.update_record(&record)?;

        Ok(record)
    }

    fn provider_for(&self, record: &CanonicalRecord) -> Result<(Arc<dyn ContentProvider>, String)> {
        record
            .external_ids
            .iter()
            .filter(|e| !e.id.trim().is_empty())
            .find_map(|e| self.registry.get(&e.provider).map(|p| (p, e.id.clone())))
            .ok_or_else(|| {
                Error::validation(format!(
                    "record {} has no external id from a registered provider",
                    record.id
                ))
            })
    }

    async fn scan(&self, library: &Library, cancel: &CancellationToken) -> Result<Vec<ScanResult>> {
        let scanner = self.scanner.clone();
        let roots: Vec<PathBuf> = library.paths.iter().map(PathBuf::from).collect();
        let cancel = cancel.clone();

        tokio::task::spawn_blocking(move || scanner.scan(&roots, &cancel))
            .await
            .map_err(|e| Error::internal(format!("scan task failed: {e}")))?
    }

    fn persist_new(
        &self,
        library: &Library,
        scan: &ScanResult,
        metadata: &RecordMetadata,
    ) -> Result<CanonicalRecord> {
        let title = if metadata.title.trim().is_empty() {
            scan.title.as_str()
        } else {
            metadata.title.as_str()
        };
        let mut record = CanonicalRecord::new(library.id, library.kind, title);
        mapper::apply_to_record(&mut record, metadata);
        record.file_path = Some(scan.relative_path.clone());
        for fingerprint in &metadata.fingerprints {
            record.set_fingerprint(fingerprint.clone());
        }

        self.repo.create_record(&record)?;
        self.repo.create_file_record(&file_record(library.id, record.id, scan))?;

        info!(
            record_id = %record.id,
            title = %record.title,
            provider = %metadata.provider,
            external_id = %metadata.external_id,
            "Created record"
        );
        Ok(record)
    }

    fn touch_existing(
        &self,
        library: &Library,
        scan: &ScanResult,
        mut record: CanonicalRecord,
    ) -> Result<()> {
        if record.file_path.is_none() {
            record.file_path = Some(scan.relative_path.clone());
        }
        self.repo.update_record(&record)?;

        let path = scan.path.to_string_lossy();
        if self.repo.get_file_record_by_path(&path)?.is_none() {
            self.repo
                .create_file_record(&file_record(library.id, record.id, scan))?;
        }
        Ok(())
    }

    fn enqueue(&self, record: &CanonicalRecord) {
        let Some(enqueuer) = &self.enqueuer else {
            return;
        };
        let job = EnrichmentJob {
            record_id: record.id,
            title: record.title.clone(),
        };
        if let Err(e) = enqueuer.enqueue(job) {
            warn!(record_id = %record.id, error = %e, "Could not queue re-enrichment");
        }
    }

    fn record_error(&self, summary: &mut RunSummary, scan: &ScanResult, error: Error) {
        warn!(path = %scan.path.display(), error = %error, "File failed during enrichment");
        summary.errors.push(FileError {
            path: scan.path.clone(),
            error,
        });
    }
}

fn file_record(library_id: LibraryId, record_id: RecordId, scan: &ScanResult) -> FileRecord {
    FileRecord {
        id: FileRecordId::new(),
        record_id,
        library_id,
        file_path: scan.path.to_string_lossy().into_owned(),
        relative_path: scan.relative_path.clone(),
        file_name: scan.file_name.clone(),
        file_size: i64::try_from(scan.file_size).unwrap_or(i64::MAX),
        container: container_from_path(&scan.path),
        created_at: Utc::now(),
    }
}

/// Holds a library's slot in the active-run set until dropped.
struct RunGuard<'a> {
    runs: &'a DashSet<LibraryId>,
    library_id: LibraryId,
}

impl<'a> RunGuard<'a> {
    fn acquire(runs: &'a DashSet<LibraryId>, library_id: LibraryId) -> Result<Self> {
        if !runs.insert(library_id) {
            return Err(Error::Conflict(format!(
                "an enrichment run for library {library_id} is already in progress"
            )));
        }
        Ok(Self { runs, library_id })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.runs.remove(&self.library_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::SqliteRepository;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use reelmatch_common::{ContentKind, ExternalId};
    use reelmatch_db::pool::init_memory_pool;

    /// Provider that answers every search with one fixed candidate and
    /// counts fetches.
    struct StubProvider {
        fetches: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ContentProvider for StubProvider {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn kind(&self) -> ContentKind {
            ContentKind::Movie
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn fetch_by_external_id(
            &self,
            external_id: &str,
            _cancel: &CancellationToken,
        ) -> Result<RecordMetadata> {
            self.fetches.lock().push(external_id.to_string());
            Ok(RecordMetadata {
                provider: "stub".into(),
                external_id: external_id.into(),
                title: "Heat".into(),
                overview: Some("A thief and a detective.".into()),
                year: Some(1995),
                ..Default::default()
            })
        }

        async fn match_by_heuristics(
            &self,
            title: &str,
            year: Option<i32>,
            _cancel: &CancellationToken,
        ) -> Result<Vec<RecordMetadata>> {
            Ok(vec![RecordMetadata {
                provider: "stub".into(),
                external_id: "949".into(),
                title: title.into(),
                year,
                ..Default::default()
            }])
        }
    }

    fn service() -> (EnrichmentService, Arc<SqliteRepository>, Arc<StubProvider>) {
        let repo = Arc::new(SqliteRepository::new(init_memory_pool().unwrap()));
        let provider = Arc::new(StubProvider {
            fetches: Mutex::new(Vec::new()),
        });
        let mut registry = ProviderRegistry::new();
        registry.register(provider.clone());
        (EnrichmentService::new(repo.clone(), registry), repo, provider)
    }

    #[tokio::test]
    async fn re_enrich_without_external_id_is_validation() {
        let (service, repo, provider) = service();
        let library = repo.create_library("Movies", ContentKind::Movie, &[]).unwrap();
        let record = CanonicalRecord::new(library.id, ContentKind::Movie, "Heat");
        repo.create_record(&record).unwrap();

        let err = service
            .re_enrich(record.id, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_matches!(err, Error::Validation(_));
        assert!(provider.fetches.lock().is_empty());
    }

    #[tokio::test]
    async fn re_enrich_ignores_unregistered_providers() {
        let (service, repo, provider) = service();
        let library = repo.create_library("Movies", ContentKind::Movie, &[]).unwrap();
        let mut record = CanonicalRecord::new(library.id, ContentKind::Movie, "Heat");
        record.set_external_id(ExternalId::new("imdb", "tt0113277"));
        repo.create_record(&record).unwrap();

        let err = service
            .re_enrich(record.id, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_matches!(err, Error::Validation(_));
        assert!(provider.fetches.lock().is_empty());
    }

    #[tokio::test]
    async fn re_enrich_overwrites_descriptive_fields() {
        let (service, repo, provider) = service();
        let library = repo.create_library("Movies", ContentKind::Movie, &[]).unwrap();
        let mut record = CanonicalRecord::new(library.id, ContentKind::Movie, "heat");
        record.file_path = Some("Heat (1995).mkv".into());
        record.set_external_id(ExternalId::new("stub", "949"));
        repo.create_record(&record).unwrap();

        let refreshed = service
            .re_enrich(record.id, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(*provider.fetches.lock(), vec!["949".to_string()]);
        assert_eq!(refreshed.id, record.id);
        assert_eq!(refreshed.title, "Heat");
        assert_eq!(refreshed.file_path.as_deref(), Some("Heat (1995).mkv"));

        let stored = repo.get_record(record.id).unwrap().unwrap();
        assert_eq!(stored.overview.as_deref(), Some("A thief and a detective."));
        assert_eq!(stored.year, Some(1995));
    }

    #[tokio::test]
    async fn re_enrich_missing_record() {
        let (service, _repo, _provider) = service();
        let err = service
            .re_enrich(RecordId::new(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn concurrent_run_for_same_library_conflicts() {
        let (service, repo, _provider) = service();
        let dir = tempfile::tempdir().unwrap();
        let library = repo
            .create_library(
                "Movies",
                ContentKind::Movie,
                &[dir.path().to_string_lossy().into_owned()],
            )
            .unwrap();

        let _held = RunGuard::acquire(&service.active_runs, library.id).unwrap();
        assert!(service.is_running(library.id));

        let err = service
            .run_library(library.id, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_matches!(err, Error::Conflict(_));
    }

    #[tokio::test]
    async fn run_releases_lock_on_scan_failure() {
        let (service, repo, _provider) = service();
        let library = repo
            .create_library("Movies", ContentKind::Movie, &["/nonexistent/reelmatch".into()])
            .unwrap();

        let err = service
            .run_library(library.id, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_matches!(err, Error::ScanIo { .. });
        assert!(!service.is_running(library.id));
    }

    #[tokio::test]
    async fn run_creates_records_and_files() {
        let (service, repo, _provider) = service();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Heat (1995).mkv"), b"x").unwrap();
        let library = repo
            .create_library(
                "Movies",
                ContentKind::Movie,
                &[dir.path().to_string_lossy().into_owned()],
            )
            .unwrap();

        let summary = service
            .run_library(library.id, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(summary.total_files, 1);
        assert_eq!(summary.created, 1);

        let records = repo.list_records(library.id).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].external_id("stub"), Some("949"));
        let files = repo.list_file_records(records[0].id).unwrap();
        assert_eq!(files[0].container.as_deref(), Some("mkv"));

        // A second run finds the record at the same path.
        let again = service
            .run_library(library.id, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(again.created, 0);
        assert_eq!(again.existing, 1);
        assert_eq!(repo.list_file_records(records[0].id).unwrap().len(), 1);
    }
}
