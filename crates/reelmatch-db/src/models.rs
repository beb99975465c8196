//! Internal Rust models matching the database schema.
//!
//! Vec-valued columns (genres, credits, library paths) are stored as JSON
//! text; external ids and fingerprints live in their own tables and are
//! loaded alongside the record.

use chrono::{DateTime, NaiveDate, Utc};
use reelmatch_common::{
    ContentKind, ExternalId, FileRecordId, Fingerprint, FingerprintAlgorithm, LibraryId, RecordId,
};
use serde::{Deserialize, Serialize};

/// Media library model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Library {
    pub id: LibraryId,
    pub name: String,
    pub kind: ContentKind,
    pub paths: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A cast credit: who appeared, as whom, and in what billing order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CastCredit {
    pub person_id: Option<String>,
    pub name: String,
    pub character: Option<String>,
    pub order: Option<i32>,
    pub profile_path: Option<String>,
}

/// A crew credit: who worked on it, in which department and job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CrewCredit {
    pub person_id: Option<String>,
    pub name: String,
    pub department: Option<String>,
    pub job: Option<String>,
    pub profile_path: Option<String>,
}

/// One credit on a canonical record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Credit {
    Cast(CastCredit),
    Crew(CrewCredit),
}

/// Canonical metadata record: one piece of content, distinct from the files
/// that back it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonicalRecord {
    pub id: RecordId,
    pub library_id: LibraryId,
    pub kind: ContentKind,
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
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub studio: Option<String>,
    pub collection: Option<String>,
    pub genres: Vec<String>,
    pub credits: Vec<Credit>,
    /// Path relative to the library root. `None` for orphaned metadata.
    pub file_path: Option<String>,
    pub external_ids: Vec<ExternalId>,
    pub fingerprints: Vec<Fingerprint>,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

impl CanonicalRecord {
    /// A fresh record with only a title; every optional field absent.
    pub fn new(library_id: LibraryId, kind: ContentKind, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::new(),
            library_id,
            kind,
            title: title.into(),
            original_title: None,
            year: None,
            release_date: None,
            runtime_minutes: None,
            overview: None,
            tagline: None,
            vote_average: None,
            vote_count: None,
            popularity: None,
            budget: None,
            revenue: None,
            poster_path: None,
            backdrop_path: None,
            studio: None,
            collection: None,
            genres: Vec::new(),
            credits: Vec::new(),
            file_path: None,
            external_ids: Vec::new(),
            fingerprints: Vec::new(),
            date_created: now,
            date_modified: now,
        }
    }

    /// The id this record carries for `provider`, if any.
    pub fn external_id(&self, provider: &str) -> Option<&str> {
        self.external_ids
            .iter()
            .find(|e| e.provider == provider)
            .map(|e| e.id.as_str())
    }

    /// Insert or replace the id for `external.provider`.
    pub fn set_external_id(&mut self, external: ExternalId) {
        match self
            .external_ids
            .iter_mut()
            .find(|e| e.provider == external.provider)
        {
            Some(existing) => existing.id = external.id,
            None => self.external_ids.push(external),
        }
    }

    /// The fingerprint stored for `algorithm`, if any.
    pub fn fingerprint(&self, algorithm: FingerprintAlgorithm) -> Option<&Fingerprint> {
        self.fingerprints.iter().find(|f| f.algorithm == algorithm)
    }

    /// Insert or replace the fingerprint for its algorithm.
    pub fn set_fingerprint(&mut self, fingerprint: Fingerprint) {
        match self
            .fingerprints
            .iter_mut()
            .find(|f| f.algorithm == fingerprint.algorithm)
        {
            Some(existing) => *existing = fingerprint,
            None => self.fingerprints.push(fingerprint),
        }
    }

    pub fn cast(&self) -> impl Iterator<Item = &CastCredit> {
        self.credits.iter().filter_map(|c| match c {
            Credit::Cast(cast) => Some(cast),
            Credit::Crew(_) => None,
        })
    }

    pub fn crew(&self) -> impl Iterator<Item = &CrewCredit> {
        self.credits.iter().filter_map(|c| match c {
            Credit::Crew(crew) => Some(crew),
            Credit::Cast(_) => None,
        })
    }
}

/// A file on disk backing a canonical record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileRecord {
    pub id: FileRecordId,
    pub record_id: RecordId,
    pub library_id: LibraryId,
    /// Absolute path on disk.
    pub file_path: String,
    /// Path relative to the library root.
    pub relative_path: String,
    pub file_name: String,
    pub file_size: i64,
    /// Container inferred from the file extension.
    pub container: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_id_upsert() {
        let mut record = CanonicalRecord::new(LibraryId::new(), ContentKind::Movie, "Heat");
        record.set_external_id(ExternalId::new("tmdb", "1"));
        record.set_external_id(ExternalId::new("imdb", "tt0113277"));
        record.set_external_id(ExternalId::new("tmdb", "949"));

        assert_eq!(record.external_ids.len(), 2);
        assert_eq!(record.external_id("tmdb"), Some("949"));
        assert_eq!(record.external_id("stashdb"), None);
    }

    #[test]
    fn fingerprint_one_per_algorithm() {
        let mut record = CanonicalRecord::new(LibraryId::new(), ContentKind::Scene, "x");
        record.set_fingerprint(Fingerprint::new(FingerprintAlgorithm::Phash, "a"));
        record.set_fingerprint(Fingerprint::new(FingerprintAlgorithm::Phash, "b"));
        record.set_fingerprint(Fingerprint::new(FingerprintAlgorithm::Md5, "c"));

        assert_eq!(record.fingerprints.len(), 2);
        assert_eq!(
            record.fingerprint(FingerprintAlgorithm::Phash).map(|f| f.hash.as_str()),
            Some("b")
        );
    }

    #[test]
    fn credit_serialization_is_tagged() {
        let credit = Credit::Crew(CrewCredit {
            name: "Michael Mann".into(),
            department: Some("Directing".into()),
            job: Some("Director".into()),
            ..Default::default()
        });
        let json = serde_json::to_value(&credit).unwrap();
        assert_eq!(json["type"], "crew");
        assert_eq!(json["job"], "Director");
    }

    #[test]
    fn cast_and_crew_split() {
        let mut record = CanonicalRecord::new(LibraryId::new(), ContentKind::Movie, "Heat");
        record.credits = vec![
            Credit::Cast(CastCredit {
                name: "Al Pacino".into(),
                order: Some(0),
                ..Default::default()
            }),
            Credit::Crew(CrewCredit {
                name: "Michael Mann".into(),
                ..Default::default()
            }),
        ];
        assert_eq!(record.cast().count(), 1);
        assert_eq!(record.crew().next().unwrap().name, "Michael Mann");
    }
}
