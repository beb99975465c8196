//! Identity matching: resolve one scanned file to a canonical record.
//!
//! Matching runs in two stages against the library's [`ContentProvider`]:
//!
//! 1. **Fingerprints.** If the record already stored at the file's path
//!    carries fingerprints, the provider is queried with them. Any hit is
//!    accepted outright.
//! 2. **Title search.** The provider is searched by parsed title and year.
//!    Candidates are walked in provider order; the first one whose year does
//!    not contradict the parsed year and whose title is similar wins.
//!
//! The matcher never writes. It reports whether the winning candidate already
//! has a canonical record and leaves persistence to the orchestrator.

use std::sync::Arc;

use reelmatch_common::{Error, LibraryId, Result};
use reelmatch_db::models::CanonicalRecord;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::provider::{ContentProvider, RecordMetadata};
use crate::repository::Repository;
use crate::scanner::ScanResult;

/// Terminal result of matching one file.
#[derive(Debug)]
pub enum MatchOutcome {
    /// The candidate already has a canonical record in this library.
    MatchedExisting(Box<CanonicalRecord>),
    /// The candidate has no record yet; the orchestrator creates one.
    MatchedNew(Box<RecordMetadata>),
    /// Nothing passed the filters. Not an error.
    Unmatched,
    /// A provider or storage error stopped matching for this file.
    Errored(Error),
}

impl MatchOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::MatchedExisting(_) | Self::MatchedNew(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::MatchedExisting(_) => "matched-existing",
            Self::MatchedNew(_) => "matched-new",
            Self::Unmatched => "unmatched",
            Self::Errored(_) => "errored",
        }
    }
}

/// Resolves scanned files against a provider and the record store.
pub struct IdentityMatcher {
    repo: Arc<dyn Repository>,
}

impl IdentityMatcher {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Match one file. Errors are folded into [`MatchOutcome::Errored`];
    /// a provider `NotFound` becomes [`MatchOutcome::Unmatched`].
    pub async fn match_file(
        &self,
        library_id: LibraryId,
        provider: &dyn ContentProvider,
        scan: &ScanResult,
        cancel: &CancellationToken,
    ) -> MatchOutcome {
        match self.resolve(library_id, provider, scan, cancel).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_not_found() => {
                debug!(
                    path = %scan.path.display(),
                    provider = provider.name(),
                    error = %e,
                    "Provider has no entry for file"
                );
                MatchOutcome::Unmatched
            }
            Err(e) => {
                warn!(
                    path = %scan.path.display(),
                    provider = provider.name(),
                    error = %e,
                    "Matching failed"
                );
                MatchOutcome::Errored(e)
            }
        }
    }

    async fn resolve(
        &self,
        library_id: LibraryId,
        provider: &dyn ContentProvider,
        scan: &ScanResult,
        cancel: &CancellationToken,
    ) -> Result<MatchOutcome> {
        let at_path = self.repo.get_record_by_path(library_id, &scan.relative_path)?;

        let candidate = match self.fingerprint_stage(provider, at_path.as_ref(), cancel).await? {
            Some(hit) => Some(hit),
            None => search_stage(provider, scan, cancel).await?,
        };

        let Some(candidate) = candidate else {
            debug!(path = %scan.path.display(), title = %scan.title, "No candidate passed");
            return Ok(MatchOutcome::Unmatched);
        };

        if let Some(record) = at_path {
            return Ok(MatchOutcome::MatchedExisting(Box::new(record)));
        }

        let known = self.repo.get_record_by_external_id(
            library_id,
            &candidate.provider,
            &candidate.external_id,
        )?;
        Ok(match known {
            Some(record) => MatchOutcome::MatchedExisting(Box::new(record)),
            None => MatchOutcome::MatchedNew(Box::new(candidate)),
        })
    }

    async fn fingerprint_stage(
        &self,
        provider: &dyn ContentProvider,
        record: Option<&CanonicalRecord>,
        cancel: &CancellationToken,
    ) -> Result<Option<RecordMetadata>> {
        let Some(record) = record.filter(|r| !r.fingerprints.is_empty()) else {
            return Ok(None);
        };

        match provider.match_by_fingerprints(&record.fingerprints, cancel).await {
            Ok(hits) => {
                let hit = hits.into_iter().next();
                if let Some(hit) = &hit {
                    debug!(
                        record_id = %record.id,
                        external_id = %hit.external_id,
                        "Fingerprint match"
                    );
                }
                Ok(hit)
            }
            // No fingerprint entry: fall through to title search
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

async fn search_stage(
    provider: &dyn ContentProvider,
    scan: &ScanResult,
    cancel: &CancellationToken,
) -> Result<Option<RecordMetadata>> {
    if scan.title.trim().is_empty() {
        return Ok(None);
    }

    let candidates = provider
        .match_by_heuristics(&scan.title, scan.year, cancel)
        .await?;

    Ok(candidates
        .into_iter()
        .find(|c| year_compatible(scan.year, c.year) && titles_similar(&scan.title, &c.title)))
}

/// A parsed year only rules out candidates whose own year is known and
/// different.
pub fn year_compatible(parsed: Option<i32>, candidate: Option<i32>) -> bool {
    match (parsed, candidate) {
        (Some(parsed), Some(candidate)) => parsed == candidate,
        _ => true,
    }
}

/// Case-insensitive title comparison: equal after trimming, or either one
/// contains the other. Empty titles never match.
pub fn titles_similar(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.contains(&b) || b.contains(&a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_filter() {
        assert!(year_compatible(Some(1999), Some(1999)));
        assert!(!year_compatible(Some(1999), Some(2003)));
        assert!(year_compatible(Some(1999), None));
        assert!(year_compatible(None, Some(2003)));
        assert!(year_compatible(None, None));
    }

    #[test]
    fn title_similarity() {
        assert!(titles_similar("The Matrix", "the matrix"));
        assert!(titles_similar("  Matrix ", "The Matrix"));
        assert!(titles_similar("The Matrix Reloaded", "matrix"));
        assert!(!titles_similar("Heat", "Inception"));
        assert!(!titles_similar("", "Heat"));
        assert!(!titles_similar("Heat", "   "));
    }

    #[test]
    fn outcome_labels() {
        assert!(MatchOutcome::MatchedNew(Box::default()).is_matched());
        assert!(!MatchOutcome::Unmatched.is_matched());
        assert_eq!(MatchOutcome::Errored(Error::Cancelled).label(), "errored");
    }
}
