//! Concrete content provider implementations.
//!
//! Each submodule wraps a single external catalog and implements the
//! [`ContentProvider`](super::ContentProvider) trait.

pub mod stashdb;
pub mod tmdb;

pub use stashdb::{StashDbClient, StashDbProvider};
pub use tmdb::{TmdbClient, TmdbProvider};
