//! Filename parsing: derive a (title, year) guess from a media file name.
//!
//! Patterns are tried in order and the first one that matches wins:
//!
//! 1. `Title (YYYY)`
//! 2. `Title.YYYY` / `Title YYYY` / `Title_YYYY` / `Title-YYYY`
//! 3. the whole stem as the title, with no year
//!
//! A year outside [`MIN_YEAR`]..=[`MAX_YEAR`] is dropped but the pattern that
//! produced it still wins; later patterns are not retried.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// Earliest accepted release year.
pub const MIN_YEAR: i32 = 1900;
/// Latest accepted release year.
pub const MAX_YEAR: i32 = 2100;

static PAREN_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<title>.+?)\s*\((?P<year>\d{4})\)").expect("valid regex")
});

static SEPARATED_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<title>.+?)[\.\s_\-]+(?P<year>\d{4})(?:[\.\s_\-\[\(]|$)").expect("valid regex")
});

/// Quality, codec, audio and edition markers. The title is cut at the first
/// one found.
static RELEASE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)\b(?:
            2160p|1080p|1080i|720p|576p|480p|4k|uhd|
            blu-?ray|bdrip|brrip|bdremux|remux|web-?dl|web-?rip|webrip|hdtv|dvdrip|dvdscr|hdrip|
            hdr10\+?|hdr|dolby\s?vision|
            x264|x265|h\s?264|h\s?265|hevc|avc|xvid|divx|av1|10bit|
            aac|ac3|eac3|ddp?5\s1|dts(?:-hd)?|truehd|atmos|flac|
            extended|unrated|remastered|theatrical|imax|directors\s?cut|director's\s?cut|
            proper|repack|limited
        )\b",
    )
    .expect("valid regex")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Title and year guessed from a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub title: String,
    pub year: Option<i32>,
}

/// Parse a file name (with or without extension) into a title and year.
///
/// # Examples
///
/// ```
/// use reelmatch::scanner::filename::parse_file_name;
///
/// let parsed = parse_file_name("The Matrix (1999).mkv");
/// assert_eq!(parsed.title, "The Matrix");
/// assert_eq!(parsed.year, Some(1999));
///
/// let parsed = parse_file_name("Inception.2010.1080p.BluRay.x264.mkv");
/// assert_eq!(parsed.title, "Inception");
/// assert_eq!(parsed.year, Some(2010));
/// ```
pub fn parse_file_name(file_name: &str) -> ParsedName {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);

    let captures = PAREN_YEAR
        .captures(stem)
        .or_else(|| SEPARATED_YEAR.captures(stem));

    match captures {
        Some(caps) => ParsedName {
            title: clean_title(&caps["title"]),
            year: caps["year"].parse().ok().filter(|y| valid_year(*y)),
        },
        None => ParsedName {
            title: clean_title(stem),
            year: None,
        },
    }
}

/// Whether `year` is a plausible release year.
pub fn valid_year(year: i32) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&year)
}

/// Normalize a raw title fragment.
///
/// Dots and underscores become spaces, the text is cut at the first release
/// marker, whitespace is collapsed and trailing separators are trimmed. If
/// cutting at a marker would leave nothing, the uncut text is kept.
pub fn clean_title(raw: &str) -> String {
    let spaced = raw.replace(['.', '_'], " ");

    let cut = match RELEASE_MARKER.find(&spaced) {
        Some(m) => &spaced[..m.start()],
        None => spaced.as_str(),
    };

    let title = tidy(cut);
    if title.is_empty() {
        tidy(&spaced)
    } else {
        title
    }
}

fn tidy(s: &str) -> String {
    let collapsed = WHITESPACE.replace_all(s, " ");
    collapsed
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '[' | '(' | '{'))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(name: &str) -> (String, Option<i32>) {
        let p = parse_file_name(name);
        (p.title, p.year)
    }

    #[test]
    fn paren_year() {
        assert_eq!(parse("The Matrix (1999).mkv"), ("The Matrix".into(), Some(1999)));
        assert_eq!(parse("Heat(1995).mp4"), ("Heat".into(), Some(1995)));
        assert_eq!(
            parse("Blade Runner 2049 (2017) [2160p].mkv"),
            ("Blade Runner 2049".into(), Some(2017))
        );
    }

    #[test]
    fn separated_year_with_markers() {
        assert_eq!(
            parse("Inception.2010.1080p.BluRay.x264.mkv"),
            ("Inception".into(), Some(2010))
        );
        assert_eq!(
            parse("The_Dark_Knight_2008_720p.mkv"),
            ("The Dark Knight".into(), Some(2008))
        );
        assert_eq!(parse("Alien 1979.avi"), ("Alien".into(), Some(1979)));
        assert_eq!(parse("Alien-1979.avi"), ("Alien".into(), Some(1979)));
        assert_eq!(parse("1917.2019.mkv"), ("1917".into(), Some(2019)));
    }

    #[test]
    fn out_of_range_year_is_dropped_not_retried() {
        assert_eq!(parse("Great Expectations (1850).mkv"), ("Great Expectations".into(), None));
        assert_eq!(parse("Old.Film.1850.mkv"), ("Old Film".into(), None));
        assert_eq!(parse("Far Future (2300).mkv"), ("Far Future".into(), None));
    }

    #[test]
    fn fallback_to_stem() {
        assert_eq!(parse("Amelie.mkv"), ("Amelie".into(), None));
        assert_eq!(
            parse("Some.Movie.1080p.WEB-DL.mkv"),
            ("Some Movie".into(), None)
        );
        assert_eq!(parse("no_year_here"), ("no year here".into(), None));
    }

    #[test]
    fn markers_are_case_insensitive() {
        assert_eq!(clean_title("Dune HEVC"), "Dune");
        assert_eq!(clean_title("Dune.Part.Two.2160p.UHD"), "Dune Part Two");
        assert_eq!(clean_title("Aliens.Directors.Cut"), "Aliens");
        assert_eq!(clean_title("Aliens Extended Edition"), "Aliens");
    }

    #[test]
    fn markers_need_word_boundaries() {
        // "Avc" inside a word is not a marker
        assert_eq!(clean_title("Havcar"), "Havcar");
        assert_eq!(clean_title("Atmosphere"), "Atmosphere");
    }

    #[test]
    fn marker_only_name_keeps_text() {
        assert_eq!(clean_title("1080p"), "1080p");
    }

    #[test]
    fn trailing_separators_trimmed() {
        assert_eq!(clean_title("Heat - "), "Heat");
        assert_eq!(clean_title("  Heat   Remastered "), "Heat");
    }

    #[test]
    fn year_bounds() {
        assert!(valid_year(1900));
        assert!(valid_year(2100));
        assert!(!valid_year(1899));
        assert!(!valid_year(2101));
    }
}
