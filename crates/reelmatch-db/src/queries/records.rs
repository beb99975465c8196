//! Canonical record queries.
//!
//! A record row carries the descriptive metadata; external ids and
//! fingerprints are written to their side tables in the same transaction and
//! loaded back with every read.

use chrono::Utc;
use reelmatch_common::{Error, ExternalId, Fingerprint, LibraryId, RecordId, Result};
use rusqlite::{Connection, OptionalExtension, Row};

use super::{map_db_error, parse_date, parse_datetime, parse_enum, parse_id, parse_json, to_json};
use crate::models::CanonicalRecord;

const RECORD_COLUMNS: &str = "id, library_id, kind, title, original_title, year, release_date, \
     runtime_minutes, overview, tagline, vote_average, vote_count, popularity, budget, revenue, \
     poster_path, backdrop_path, studio, collection, genres, credits, file_path, date_created, \
     date_modified";

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<CanonicalRecord> {
    Ok(CanonicalRecord {
        id: parse_id(0, &row.get::<_, String>(0)?)?,
        library_id: parse_id(1, &row.get::<_, String>(1)?)?,
        kind: parse_enum(2, &row.get::<_, String>(2)?)?,
        title: row.get(3)?,
        original_title: row.get(4)?,
        year: row.get(5)?,
        release_date: parse_date(6, row.get(6)?)?,
        runtime_minutes: row.get(7)?,
        overview: row.get(8)?,
        tagline: row.get(9)?,
        vote_average: row.get(10)?,
        vote_count: row.get(11)?,
        popularity: row.get(12)?,
        budget: row.get(13)?,
        revenue: row.get(14)?,
        poster_path: row.get(15)?,
        backdrop_path: row.get(16)?,
        studio: row.get(17)?,
        collection: row.get(18)?,
        genres: parse_json(19, &row.get::<_, String>(19)?)?,
        credits: parse_json(20, &row.get::<_, String>(20)?)?,
        file_path: row.get(21)?,
        external_ids: Vec::new(),
        fingerprints: Vec::new(),
        date_created: parse_datetime(22, &row.get::<_, String>(22)?)?,
        date_modified: parse_datetime(23, &row.get::<_, String>(23)?)?,
    })
}

fn load_children(conn: &Connection, record: &mut CanonicalRecord) -> Result<()> {
    let id = record.id.to_string();

    let mut stmt = conn
        .prepare(
            "SELECT provider, external_id FROM record_external_ids
             WHERE record_id = :id ORDER BY provider",
        )
        .map_err(map_db_error)?;
    record.external_ids = stmt
        .query_map(rusqlite::named_params! { ":id": id }, |row| {
            Ok(ExternalId {
                provider: row.get(0)?,
                id: row.get(1)?,
            })
        })
        .map_err(map_db_error)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(map_db_error)?;

    let mut stmt = conn
        .prepare(
            "SELECT algorithm, hash, duration_secs FROM record_fingerprints
             WHERE record_id = :id ORDER BY algorithm",
        )
        .map_err(map_db_error)?;
    record.fingerprints = stmt
        .query_map(rusqlite::named_params! { ":id": id }, |row| {
            Ok(Fingerprint {
                algorithm: parse_enum(0, &row.get::<_, String>(0)?)?,
                hash: row.get(1)?,
                duration_secs: row.get(2)?,
            })
        })
        .map_err(map_db_error)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(map_db_error)?;

    Ok(())
}

fn write_children(conn: &Connection, record: &CanonicalRecord) -> Result<()> {
    let id = record.id.to_string();

    conn.execute(
        "DELETE FROM record_external_ids WHERE record_id = :id",
        rusqlite::named_params! { ":id": id },
    )
    .map_err(map_db_error)?;
    for external in &record.external_ids {
        conn.execute(
            "INSERT INTO record_external_ids (record_id, provider, external_id)
             VALUES (:record_id, :provider, :external_id)",
            rusqlite::named_params! {
                ":record_id": id,
                ":provider": external.provider,
                ":external_id": external.id,
            },
        )
        .map_err(map_db_error)?;
    }

    conn.execute(
        "DELETE FROM record_fingerprints WHERE record_id = :id",
        rusqlite::named_params! { ":id": id },
    )
    .map_err(map_db_error)?;
    for fp in &record.fingerprints {
        conn.execute(
            "INSERT INTO record_fingerprints (record_id, algorithm, hash, duration_secs)
             VALUES (:record_id, :algorithm, :hash, :duration_secs)",
            rusqlite::named_params! {
                ":record_id": id,
                ":algorithm": fp.algorithm.to_string(),
                ":hash": fp.hash,
                ":duration_secs": fp.duration_secs,
            },
        )
        .map_err(map_db_error)?;
    }

    Ok(())
}

fn query_one(
    conn: &Connection,
    sql: &str,
    params: &[(&str, &dyn rusqlite::ToSql)],
) -> Result<Option<CanonicalRecord>> {
    let record = conn
        .query_row(sql, params, row_to_record)
        .optional()
        .map_err(map_db_error)?;

    match record {
        Some(mut record) => {
            load_children(conn, &mut record)?;
            Ok(Some(record))
        }
        None => Ok(None),
    }
}

/// Insert a new canonical record with its external ids and fingerprints.
///
/// Returns `Error::Conflict` when the library already has a record at the
/// same path.
pub fn create_record(conn: &Connection, record: &CanonicalRecord) -> Result<()> {
    let tx = conn.unchecked_transaction().map_err(map_db_error)?;

    tx.execute(
        &format!(
            "INSERT INTO records ({RECORD_COLUMNS}) VALUES (
                :id, :library_id, :kind, :title, :original_title, :year, :release_date,
                :runtime_minutes, :overview, :tagline, :vote_average, :vote_count, :popularity,
                :budget, :revenue, :poster_path, :backdrop_path, :studio, :collection, :genres,
                :credits, :file_path, :date_created, :date_modified
            )"
        ),
        rusqlite::named_params! {
            ":id": record.id.to_string(),
            ":library_id": record.library_id.to_string(),
            ":kind": record.kind.to_string(),
            ":title": record.title,
            ":original_title": record.original_title,
            ":year": record.year,
            ":release_date": record.release_date.map(|d| d.format("%Y-%m-%d").to_string()),
            ":runtime_minutes": record.runtime_minutes,
            ":overview": record.overview,
            ":tagline": record.tagline,
            ":vote_average": record.vote_average,
            ":vote_count": record.vote_count,
            ":popularity": record.popularity,
            ":budget": record.budget,
            ":revenue": record.revenue,
            ":poster_path": record.poster_path,
            ":backdrop_path": record.backdrop_path,
            ":studio": record.studio,
            ":collection": record.collection,
            ":genres": to_json(&record.genres)?,
            ":credits": to_json(&record.credits)?,
            ":file_path": record.file_path,
            ":date_created": record.date_created.to_rfc3339(),
            ":date_modified": record.date_modified.to_rfc3339(),
        },
    )
    .map_err(map_db_error)?;

    write_children(&tx, record)?;
    tx.commit().map_err(map_db_error)?;
    Ok(())
}

/// Get a record by ID.
pub fn get_record(conn: &Connection, id: RecordId) -> Result<Option<CanonicalRecord>> {
    query_one(
        conn,
        &format!("SELECT {RECORD_COLUMNS} FROM records WHERE id = :id"),
        rusqlite::named_params! { ":id": id.to_string() },
    )
}

/// Get the record at a library-relative path.
pub fn get_record_by_path(
    conn: &Connection,
    library_id: LibraryId,
    file_path: &str,
) -> Result<Option<CanonicalRecord>> {
    query_one(
        conn,
        &format!(
            "SELECT {RECORD_COLUMNS} FROM records
             WHERE library_id = :library_id AND file_path = :file_path"
        ),
        rusqlite::named_params! {
            ":library_id": library_id.to_string(),
            ":file_path": file_path,
        },
    )
}

/// Get the first record in a library linked to a provider's id.
pub fn get_record_by_external_id(
    conn: &Connection,
    library_id: LibraryId,
    provider: &str,
    external_id: &str,
) -> Result<Option<CanonicalRecord>> {
    query_one(
        conn,
        &format!(
            "SELECT {RECORD_COLUMNS} FROM records
             WHERE library_id = :library_id
               AND id IN (
                   SELECT record_id FROM record_external_ids
                   WHERE provider = :provider AND external_id = :external_id
               )
             ORDER BY date_created
             LIMIT 1"
        ),
        rusqlite::named_params! {
            ":library_id": library_id.to_string(),
            ":provider": provider,
            ":external_id": external_id,
        },
    )
}

/// List every record in a library ordered by title.
pub fn list_records(conn: &Connection, library_id: LibraryId) -> Result<Vec<CanonicalRecord>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM records
             WHERE library_id = :library_id ORDER BY title COLLATE NOCASE"
        ))
        .map_err(map_db_error)?;

    let mut records = stmt
        .query_map(
            rusqlite::named_params! { ":library_id": library_id.to_string() },
            row_to_record,
        )
        .map_err(map_db_error)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(map_db_error)?;

    for record in &mut records {
        load_children(conn, record)?;
    }

    Ok(records)
}

/// Overwrite a record and its side tables. `date_modified` is set to now.
pub fn update_record(conn: &Connection, record: &CanonicalRecord) -> Result<()> {
    let tx = conn.unchecked_transaction().map_err(map_db_error)?;

    let rows_affected = tx
        .execute(
            "UPDATE records SET
                title = :title, original_title = :original_title, year = :year,
                release_date = :release_date, runtime_minutes = :runtime_minutes,
                overview = :overview, tagline = :tagline, vote_average = :vote_average,
                vote_count = :vote_count, popularity = :popularity, budget = :budget,
                revenue = :revenue, poster_path = :poster_path, backdrop_path = :backdrop_path,
                studio = :studio, collection = :collection, genres = :genres,
                credits = :credits, file_path = :file_path, date_modified = :date_modified
             WHERE id = :id",
            rusqlite::named_params! {
                ":id": record.id.to_string(),
                ":title": record.title,
                ":original_title": record.original_title,
                ":year": record.year,
                ":release_date": record.release_date.map(|d| d.format("%Y-%m-%d").to_string()),
                ":runtime_minutes": record.runtime_minutes,
                ":overview": record.overview,
                ":tagline": record.tagline,
                ":vote_average": record.vote_average,
                ":vote_count": record.vote_count,
                ":popularity": record.popularity,
                ":budget": record.budget,
                ":revenue": record.revenue,
                ":poster_path": record.poster_path,
                ":backdrop_path": record.backdrop_path,
                ":studio": record.studio,
                ":collection": record.collection,
                ":genres": to_json(&record.genres)?,
                ":credits": to_json(&record.credits)?,
                ":file_path": record.file_path,
                ":date_modified": Utc::now().to_rfc3339(),
            },
        )
        .map_err(map_db_error)?;

    if rows_affected == 0 {
        return Err(Error::not_found("record", record.id));
    }

    write_children(&tx, record)?;
    tx.commit().map_err(map_db_error)?;
    Ok(())
}

/// Delete a record (cascades to its side tables and files).
pub fn delete_record(conn: &Connection, id: RecordId) -> Result<()> {
    let rows_affected = conn
        .execute(
            "DELETE FROM records WHERE id = :id",
            rusqlite::named_params! { ":id": id.to_string() },
        )
        .map_err(map_db_error)?;

    if rows_affected == 0 {
        return Err(Error::not_found("record", id));
    }

    Ok(())
}
