//! Media library scanner.
//!
//! Walks library roots, keeps files on the video extension allow-list and
//! parses each file name into a title/year guess. The walk is synchronous and
//! checks the cancellation token at every entry. Any I/O failure during the
//! walk aborts the scan; per-file tolerance belongs to the orchestrator.

pub mod filename;

use std::path::{Path, PathBuf};

use reelmatch_common::{paths::is_video_file, Error, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use walkdir::WalkDir;

pub use filename::{parse_file_name, ParsedName};

/// One video file found during a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// The library root the file was found under.
    pub root: PathBuf,
    /// Path relative to `root`, `/`-separated.
    pub relative_path: String,
    pub file_name: String,
    pub title: String,
    pub year: Option<i32>,
    pub file_size: u64,
    /// Set when the file was found but no usable title could be derived.
    pub scan_error: Option<String>,
}

/// Scanner for discovering video files under library roots.
#[derive(Debug, Clone)]
pub struct PathScanner {
    follow_links: bool,
}

impl Default for PathScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl PathScanner {
    pub fn new() -> Self {
        Self { follow_links: true }
    }

    /// Do not descend into symlinked directories.
    #[must_use]
    pub fn without_symlinks(mut self) -> Self {
        self.follow_links = false;
        self
    }

    /// Scan every root in order, returning all results or the first fatal
    /// error.
    pub fn scan(&self, roots: &[PathBuf], cancel: &CancellationToken) -> Result<Vec<ScanResult>> {
        let mut results = Vec::new();
        for root in roots {
            results.extend(self.scan_root(root, cancel)?);
        }
        Ok(results)
    }

    /// Scan a single root directory.
    pub fn scan_root(&self, root: &Path, cancel: &CancellationToken) -> Result<Vec<ScanResult>> {
        info!(root = %root.display(), "Scanning library root");
        let mut results = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(self.follow_links)
            .sort_by_file_name()
        {
            if cancel.is_cancelled() {
                info!(root = %root.display(), "Scan cancelled");
                return Err(Error::Cancelled);
            }

            let entry = entry.map_err(|e| walk_error(root, e))?;
            if entry.file_type().is_dir() || !is_video_file(entry.path()) {
                continue;
            }

            let metadata = entry
                .metadata()
                .map_err(|e| walk_error(root, e))?;

            let result = build_result(root, entry.path(), metadata.len());
            debug!(
                path = %result.path.display(),
                title = %result.title,
                year = ?result.year,
                "Found video file"
            );
            results.push(result);
        }

        info!(root = %root.display(), files = results.len(), "Scan complete");
        Ok(results)
    }
}

fn walk_error(root: &Path, err: walkdir::Error) -> Error {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    let message = err.to_string();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other(message));
    Error::scan_io(path, source)
}

fn build_result(root: &Path, path: &Path, file_size: u64) -> ScanResult {
    let relative_path = path
        .strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    let raw_name = path.file_name().unwrap_or_default();
    let file_name = raw_name.to_string_lossy().into_owned();

    let mut scan_error = None;
    if raw_name.to_str().is_none() {
        scan_error = Some("file name is not valid UTF-8".to_string());
    }

    let ParsedName { title, year } = parse_file_name(&file_name);
    if title.is_empty() && scan_error.is_none() {
        scan_error = Some("no title could be derived from the file name".to_string());
    }

    ScanResult {
        path: path.to_path_buf(),
        root: root.to_path_buf(),
        relative_path,
        file_name,
        title,
        year,
        file_size,
        scan_error,
    }
}
