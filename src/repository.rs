//! Persistence seam used by the matcher and orchestrator.
//!
//! [`Repository`] covers what enrichment needs from storage: libraries by
//! id, canonical records by id, path and external id, and file records.
//! [`SqliteRepository`] implements it over the `reelmatch-db` pool.

use reelmatch_common::{ContentKind, FileRecordId, LibraryId, RecordId, Result};
use reelmatch_db::models::{CanonicalRecord, FileRecord, Library};
use reelmatch_db::pool::{get_conn, DbPool};
use reelmatch_db::queries::{libraries, record_files, records};

/// Storage operations for canonical records and their files.
pub trait Repository: Send + Sync {
    fn get_library(&self, id: LibraryId) -> Result<Option<Library>>;

    fn get_record(&self, id: RecordId) -> Result<Option<CanonicalRecord>>;
    fn get_record_by_path(
        &self,
        library_id: LibraryId,
        relative_path: &str,
    ) -> Result<Option<CanonicalRecord>>;
    fn get_record_by_external_id(
        &self,
        library_id: LibraryId,
        provider: &str,
        external_id: &str,
    ) -> Result<Option<CanonicalRecord>>;
    fn list_records(&self, library_id: LibraryId) -> Result<Vec<CanonicalRecord>>;
    fn create_record(&self, record: &CanonicalRecord) -> Result<()>;
    fn update_record(&self, record: &CanonicalRecord) -> Result<()>;
    fn delete_record(&self, id: RecordId) -> Result<()>;

    fn create_file_record(&self, file: &FileRecord) -> Result<()>;
    fn get_file_record_by_path(&self, file_path: &str) -> Result<Option<FileRecord>>;
    fn list_file_records(&self, record_id: RecordId) -> Result<Vec<FileRecord>>;
    fn delete_file_record(&self, id: FileRecordId) -> Result<()>;
}

/// [`Repository`] over a SQLite connection pool.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn create_library(&self, name: &str, kind: ContentKind, paths: &[String]) -> Result<Library> {
        let conn = get_conn(&self.pool)?;
        libraries::create_library(&conn, name, kind, paths)
    }

    pub fn list_libraries(&self) -> Result<Vec<Library>> {
        let conn = get_conn(&self.pool)?;
        libraries::list_libraries(&conn)
    }

    pub fn delete_library(&self, id: LibraryId) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        libraries::delete_library(&conn, id)
    }
}

impl Repository for SqliteRepository {
    fn get_library(&self, id: LibraryId) -> Result<Option<Library>> {
        let conn = get_conn(&self.pool)?;
        libraries::get_library(&conn, id)
    }

    fn get_record(&self, id: RecordId) -> Result<Option<CanonicalRecord>> {
        let conn = get_conn(&self.pool)?;
        records::get_record(&conn, id)
    }

    fn get_record_by_path(
        &self,
        library_id: LibraryId,
        relative_path: &str,
    ) -> Result<Option<CanonicalRecord>> {
        let conn = get_conn(&self.pool)?;
        records::get_record_by_path(&conn, library_id, relative_path)
    }

    fn get_record_by_external_id(
        &self,
        library_id: LibraryId,
        provider: &str,
        external_id: &str,
    ) -> Result<Option<CanonicalRecord>> {
        let conn = get_conn(&self.pool)?;
        records::get_record_by_external_id(&conn, library_id, provider, external_id)
    }

    fn list_records(&self, library_id: LibraryId) -> Result<Vec<CanonicalRecord>> {
        let conn = get_conn(&self.pool)?;
        records::list_records(&conn, library_id)
    }

    fn create_record(&self, record: &CanonicalRecord) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        records::create_record(&conn, record)
    }

    fn update_record(&self, record: &CanonicalRecord) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        records::update_record(&conn, record)
    }

    fn delete_record(&self, id: RecordId) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        records::delete_record(&conn, id)
    }

    fn create_file_record(&self, file: &FileRecord) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        record_files::create_file_record(&conn, file)
    }

    fn get_file_record_by_path(&self, file_path: &str) -> Result<Option<FileRecord>> {
        let conn = get_conn(&self.pool)?;
        record_files::get_file_record_by_path(&conn, file_path)
    }

    fn list_file_records(&self, record_id: RecordId) -> Result<Vec<FileRecord>> {
        let conn = get_conn(&self.pool)?;
        record_files::list_file_records(&conn, record_id)
    }

    fn delete_file_record(&self, id: FileRecordId) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        record_files::delete_file_record(&conn, id)
    }
}
