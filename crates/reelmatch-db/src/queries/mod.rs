//! Database query modules.
//!
//! - libraries: Library management
//! - records: Canonical record CRUD and lookups by path and external id
//! - record_files: Files backing canonical records
//!
//! Query functions take a `&Connection` and return the common `Result`.
//! Single-row lookups return `Ok(None)` when nothing matches; updates and
//! deletes of a missing row return `Error::NotFound`.

pub mod libraries;
pub mod record_files;
pub mod records;

use chrono::{DateTime, NaiveDate, Utc};
use reelmatch_common::Error;
use rusqlite::types::Type;
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Map a rusqlite error, turning unique-constraint violations into
/// `Error::Conflict`.
pub(crate) fn map_db_error(e: rusqlite::Error) -> Error {
    match e {
        rusqlite::Error::SqliteFailure(ref err, ref msg)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Error::Conflict(msg.clone().unwrap_or_else(|| e.to_string()))
        }
        other => Error::database(other.to_string()),
    }
}

fn conversion_error(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

pub(crate) fn parse_id<T: From<Uuid>>(idx: usize, s: &str) -> rusqlite::Result<T> {
    Uuid::parse_str(s)
        .map(T::from)
        .map_err(|e| conversion_error(idx, e))
}

pub(crate) fn parse_datetime(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

pub(crate) fn parse_date(idx: usize, s: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    s.map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| conversion_error(idx, e)))
        .transpose()
}

pub(crate) fn parse_json<T: DeserializeOwned>(idx: usize, s: &str) -> rusqlite::Result<T> {
    serde_json::from_str(s).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn parse_enum<T>(idx: usize, s: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = Error>,
{
    s.parse().map_err(|e: Error| conversion_error(idx, e))
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> reelmatch_common::Result<String> {
    serde_json::to_string(value).map_err(|e| Error::internal(e.to_string()))
}
