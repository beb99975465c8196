//! Reelmatch-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across reelmatch:
//!
//! - **Typed IDs**: Type-safe UUID wrappers for libraries, records and files
//! - **Core Types**: Content kinds, fingerprints and external identifiers
//! - **Path Utilities**: The fixed video extension allow-list
//! - **Error Handling**: The unified error taxonomy and result alias
//!
//! # Examples
//!
//! ```
//! use reelmatch_common::{ContentKind, Error, RecordId, Result};
//! use reelmatch_common::paths::is_video_file;
//! use std::path::Path;
//!
//! let record_id = RecordId::new();
//! let kind = ContentKind::Movie;
//!
//! assert!(is_video_file(Path::new("movie.mkv")));
//!
//! fn example(id: RecordId) -> Result<()> {
//!     Err(Error::not_found("record", id))
//! }
//! assert!(example(record_id).unwrap_err().is_not_found());
//! assert_eq!(kind.to_string(), "movie");
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
