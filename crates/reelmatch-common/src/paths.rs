//! Path utilities for recognizing video files by extension.
//!
//! The allow-list is fixed; recognized formats are not configurable at
//! runtime. The scanner uses [`is_video_file`] to filter walk entries and the
//! orchestrator uses [`container_from_path`] as its only technical probe.

use std::path::Path;

/// Recognized video file extensions, lowercase.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "ts", "m2ts", "webm", "mov", "wmv", "flv", "mpg", "mpeg",
];

/// Check if a path has a video file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use reelmatch_common::paths::is_video_file;
///
/// assert!(is_video_file(Path::new("movie.mkv")));
/// assert!(is_video_file(Path::new("/path/to/video.MP4")));
/// assert!(!is_video_file(Path::new("subtitle.srt")));
/// ```
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Infer the container format from a file's extension.
///
/// Returns the lowercased extension for recognized video files and `None`
/// otherwise.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use reelmatch_common::paths::container_from_path;
///
/// assert_eq!(container_from_path(Path::new("Heat (1995).MKV")).as_deref(), Some("mkv"));
/// assert_eq!(container_from_path(Path::new("notes.txt")), None);
/// ```
pub fn container_from_path(path: &Path) -> Option<String> {
    if !is_video_file(path) {
        return None;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
}

/// Get the list of video file extensions.
#[must_use]
pub fn video_extensions() -> &'static [&'static str] {
    VIDEO_EXTENSIONS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_video_file() {
        for ext in VIDEO_EXTENSIONS {
            assert!(is_video_file(Path::new(&format!("movie.{ext}"))), "{ext}");
        }

        // Case insensitive
        assert!(is_video_file(Path::new("movie.MKV")));
        assert!(is_video_file(Path::new("movie.Mp4")));

        // Not video files
        assert!(!is_video_file(Path::new("subtitle.srt")));
        assert!(!is_video_file(Path::new("poster.jpg")));
        assert!(!is_video_file(Path::new("movie.nfo")));
        assert!(!is_video_file(Path::new("no_extension")));
    }

    #[test]
    fn test_edge_cases() {
        assert!(!is_video_file(Path::new("")));
        assert!(is_video_file(Path::new(".hidden.mkv")));
        assert!(is_video_file(Path::new("The.Movie.2010.1080p.mkv")));
    }

    #[test]
    fn test_container_from_path() {
        assert_eq!(
            container_from_path(Path::new("/media/a.m2ts")).as_deref(),
            Some("m2ts")
        );
        assert_eq!(container_from_path(Path::new("a.Mov")).as_deref(), Some("mov"));
        assert_eq!(container_from_path(Path::new("a.srt")), None);
        assert_eq!(container_from_path(Path::new("a")), None);
    }
}
