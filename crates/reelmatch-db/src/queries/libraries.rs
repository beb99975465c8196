//! Library database queries.

use chrono::Utc;
use reelmatch_common::{ContentKind, Error, LibraryId, Result};
use rusqlite::{Connection, OptionalExtension, Row};

use super::{map_db_error, parse_datetime, parse_enum, parse_id, parse_json, to_json};
use crate::models::Library;

const LIBRARY_COLUMNS: &str = "id, name, kind, paths, created_at";

fn row_to_library(row: &Row<'_>) -> rusqlite::Result<Library> {
    Ok(Library {
        id: parse_id(0, &row.get::<_, String>(0)?)?,
        name: row.get(1)?,
        kind: parse_enum(2, &row.get::<_, String>(2)?)?,
        paths: parse_json(3, &row.get::<_, String>(3)?)?,
        created_at: parse_datetime(4, &row.get::<_, String>(4)?)?,
    })
}

/// Create a new library.
///
/// # Arguments
///
/// * `conn` - Database connection
/// * `name` - Library name
/// * `kind` - Content kind, which selects the catalog used for matching
/// * `paths` - Root directories to scan
pub fn create_library(
    conn: &Connection,
    name: &str,
    kind: ContentKind,
    paths: &[String],
) -> Result<Library> {
    let library = Library {
        id: LibraryId::new(),
        name: name.to_string(),
        kind,
        paths: paths.to_vec(),
        created_at: Utc::now(),
    };

    conn.execute(
        "INSERT INTO libraries (id, name, kind, paths, created_at)
         VALUES (:id, :name, :kind, :paths, :created_at)",
        rusqlite::named_params! {
            ":id": library.id.to_string(),
            ":name": library.name,
            ":kind": kind.to_string(),
            ":paths": to_json(&library.paths)?,
            ":created_at": library.created_at.to_rfc3339(),
        },
    )
    .map_err(map_db_error)?;

    Ok(library)
}

/// Get a library by ID.
pub fn get_library(conn: &Connection, id: LibraryId) -> Result<Option<Library>> {
    conn.query_row(
        &format!("SELECT {LIBRARY_COLUMNS} FROM libraries WHERE id = :id"),
        rusqlite::named_params! { ":id": id.to_string() },
        row_to_library,
    )
    .optional()
    .map_err(map_db_error)
}

/// List all libraries ordered by name.
pub fn list_libraries(conn: &Connection) -> Result<Vec<Library>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {LIBRARY_COLUMNS} FROM libraries ORDER BY name"
        ))
        .map_err(map_db_error)?;

    let libraries = stmt
        .query_map([], row_to_library)
        .map_err(map_db_error)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(map_db_error)?;

    Ok(libraries)
}

/// Replace a library's root paths.
pub fn update_library_paths(conn: &Connection, id: LibraryId, paths: &[String]) -> Result<()> {
    let rows_affected = conn
        .execute(
            "UPDATE libraries SET paths = :paths WHERE id = :id",
            rusqlite::named_params! {
                ":id": id.to_string(),
                ":paths": to_json(&paths)?,
            },
        )
        .map_err(map_db_error)?;

    if rows_affected == 0 {
        return Err(Error::not_found("library", id));
    }

    Ok(())
}

/// Delete a library (cascades to its records and files).
pub fn delete_library(conn: &Connection, id: LibraryId) -> Result<()> {
    let rows_affected = conn
        .execute(
            "DELETE FROM libraries WHERE id = :id",
            rusqlite::named_params! { ":id": id.to_string() },
        )
        .map_err(map_db_error)?;

    if rows_affected == 0 {
        return Err(Error::not_found("library", id));
    }

    Ok(())
}
