//! Queries for files backing canonical records.

use reelmatch_common::{Error, FileRecordId, RecordId, Result};
use rusqlite::{Connection, OptionalExtension, Row};

use super::{map_db_error, parse_datetime, parse_id};
use crate::models::FileRecord;

const FILE_COLUMNS: &str =
    "id, record_id, library_id, file_path, relative_path, file_name, file_size, container, created_at";

fn row_to_file(row: &Row<'_>) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        id: parse_id(0, &row.get::<_, String>(0)?)?,
        record_id: parse_id(1, &row.get::<_, String>(1)?)?,
        library_id: parse_id(2, &row.get::<_, String>(2)?)?,
        file_path: row.get(3)?,
        relative_path: row.get(4)?,
        file_name: row.get(5)?,
        file_size: row.get(6)?,
        container: row.get(7)?,
        created_at: parse_datetime(8, &row.get::<_, String>(8)?)?,
    })
}

/// Insert a file record. A file path can back only one record.
pub fn create_file_record(conn: &Connection, file: &FileRecord) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO record_files ({FILE_COLUMNS}) VALUES (
                :id, :record_id, :library_id, :file_path, :relative_path, :file_name,
                :file_size, :container, :created_at
            )"
        ),
        rusqlite::named_params! {
            ":id": file.id.to_string(),
            ":record_id": file.record_id.to_string(),
            ":library_id": file.library_id.to_string(),
            ":file_path": file.file_path,
            ":relative_path": file.relative_path,
            ":file_name": file.file_name,
            ":file_size": file.file_size,
            ":container": file.container,
            ":created_at": file.created_at.to_rfc3339(),
        },
    )
    .map_err(map_db_error)?;

    Ok(())
}

/// Get a file record by ID.
pub fn get_file_record(conn: &Connection, id: FileRecordId) -> Result<Option<FileRecord>> {
    conn.query_row(
        &format!("SELECT {FILE_COLUMNS} FROM record_files WHERE id = :id"),
        rusqlite::named_params! { ":id": id.to_string() },
        row_to_file,
    )
    .optional()
    .map_err(map_db_error)
}

/// Get a file record by its absolute path.
pub fn get_file_record_by_path(conn: &Connection, file_path: &str) -> Result<Option<FileRecord>> {
    conn.query_row(
        &format!("SELECT {FILE_COLUMNS} FROM record_files WHERE file_path = :file_path"),
        rusqlite::named_params! { ":file_path": file_path },
        row_to_file,
    )
    .optional()
    .map_err(map_db_error)
}

/// List the files backing a record.
pub fn list_file_records(conn: &Connection, record_id: RecordId) -> Result<Vec<FileRecord>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {FILE_COLUMNS} FROM record_files
             WHERE record_id = :record_id ORDER BY file_path"
        ))
        .map_err(map_db_error)?;

    let files = stmt
        .query_map(
            rusqlite::named_params! { ":record_id": record_id.to_string() },
            row_to_file,
        )
        .map_err(map_db_error)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(map_db_error)?;

    Ok(files)
}

/// Overwrite a file record's mutable columns.
pub fn update_file_record(conn: &Connection, file: &FileRecord) -> Result<()> {
    let rows_affected = conn
        .execute(
            "UPDATE record_files SET
                record_id = :record_id, file_path = :file_path,
                relative_path = :relative_path, file_name = :file_name,
                file_size = :file_size, container = :container
             WHERE id = :id",
            rusqlite::named_params! {
                ":id": file.id.to_string(),
                ":record_id": file.record_id.to_string(),
                ":file_path": file.file_path,
                ":relative_path": file.relative_path,
                ":file_name": file.file_name,
                ":file_size": file.file_size,
                ":container": file.container,
            },
        )
        .map_err(map_db_error)?;

    if rows_affected == 0 {
        return Err(Error::not_found("file record", file.id));
    }

    Ok(())
}

/// Delete a file record. The canonical record it backed is kept.
pub fn delete_file_record(conn: &Connection, id: FileRecordId) -> Result<()> {
    let rows_affected = conn
        .execute(
            "DELETE FROM record_files WHERE id = :id",
            rusqlite::named_params! { ":id": id.to_string() },
        )
        .map_err(map_db_error)?;

    if rows_affected == 0 {
        return Err(Error::not_found("file record", id));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CanonicalRecord;
    use crate::pool::{get_conn, init_memory_pool};
    use crate::queries::{libraries, records};
    use chrono::Utc;
    use reelmatch_common::ContentKind;

    fn setup(conn: &Connection) -> CanonicalRecord {
        let library = libraries::create_library(conn, "Movies", ContentKind::Movie, &[]).unwrap();
        let record = CanonicalRecord::new(library.id, ContentKind::Movie, "Heat");
        records::create_record(conn, &record).unwrap();
        record
    }

    fn file_for(record: &CanonicalRecord, path: &str) -> FileRecord {
        FileRecord {
            id: FileRecordId::new(),
            record_id: record.id,
            library_id: record.library_id,
            file_path: format!("/media/movies/{path}"),
            relative_path: path.to_string(),
            file_name: path.rsplit('/').next().unwrap_or(path).to_string(),
            file_size: 1_024,
            container: Some("mkv".into()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_create_get_and_list() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();
        let record = setup(&conn);

        let file = file_for(&record, "Heat (1995)/Heat (1995).mkv");
        create_file_record(&conn, &file).unwrap();

        let fetched = get_file_record(&conn, file.id).unwrap().unwrap();
        assert_eq!(fetched.file_name, "Heat (1995).mkv");
        assert_eq!(fetched.container.as_deref(), Some("mkv"));

        let by_path = get_file_record_by_path(&conn, &file.file_path).unwrap().unwrap();
        assert_eq!(by_path.id, file.id);

        assert_eq!(list_file_records(&conn, record.id).unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_path_conflicts() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();
        let record = setup(&conn);

        create_file_record(&conn, &file_for(&record, "a.mkv")).unwrap();
        let err = create_file_record(&conn, &file_for(&record, "a.mkv")).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_update_and_delete() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();
        let record = setup(&conn);

        let mut file = file_for(&record, "a.mkv");
        create_file_record(&conn, &file).unwrap();

        file.file_size = 2_048;
        update_file_record(&conn, &file).unwrap();
        assert_eq!(get_file_record(&conn, file.id).unwrap().unwrap().file_size, 2_048);

        delete_file_record(&conn, file.id).unwrap();
        assert!(get_file_record(&conn, file.id).unwrap().is_none());
        assert!(delete_file_record(&conn, file.id).unwrap_err().is_not_found());
        // Record survives without its file
        assert!(records::get_record(&conn, record.id).unwrap().is_some());
    }

    #[test]
    fn test_files_cascade_with_record() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();
        let record = setup(&conn);

        let file = file_for(&record, "a.mkv");
        create_file_record(&conn, &file).unwrap();
        records::delete_record(&conn, record.id).unwrap();

        assert!(get_file_record(&conn, file.id).unwrap().is_none());
    }
}
