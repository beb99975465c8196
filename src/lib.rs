//! Reelmatch - media ingestion core
//!
//! Scans library roots for video files, matches each one against TMDB
//! (movies) or StashDB (scenes), and persists enriched canonical records.
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod metadata;
pub mod repository;
pub mod scanner;
