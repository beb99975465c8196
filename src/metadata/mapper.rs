//! Conversion from provider wire types to domain metadata.
//!
//! Everything here is pure: no I/O and no shared state. Two catalog
//! conventions are normalized on the way through:
//!
//! - numeric fields use `0` for "unknown", so a zero becomes `None`;
//! - dates are `YYYY-MM-DD` strings that are often empty, so an empty or
//!   malformed date becomes `None` rather than an error.

use chrono::NaiveDate;
use reelmatch_common::{ExternalId, Fingerprint, FingerprintAlgorithm};
use reelmatch_db::models::{CanonicalRecord, CastCredit, Credit, CrewCredit};

use super::provider::{CollectionMetadata, PersonMetadata, RecordMetadata};
use super::providers::stashdb::{self, types as stash};
use super::providers::tmdb::{self, types as tmdb_types};

/// Date format used by both catalogs.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const POSTER_SIZE: &str = "w500";
pub const BACKDROP_SIZE: &str = "w1280";
pub const PROFILE_SIZE: &str = "w185";

// ---------------------------------------------------------------------------
// Scalar helpers
// ---------------------------------------------------------------------------

/// Parse a `YYYY-MM-DD` date. Empty or malformed input yields `None`.
pub fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Year from the leading four characters of a date string.
///
/// ```
/// use reelmatch::metadata::mapper::extract_year;
///
/// assert_eq!(extract_year(Some("1999-03-31")), Some(1999));
/// assert_eq!(extract_year(Some("19x9-03-31")), None);
/// assert_eq!(extract_year(Some("199")), None);
/// ```
pub fn extract_year(value: Option<&str>) -> Option<i32> {
    let head = value?.get(..4)?;
    if !head.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    head.parse().ok()
}

fn non_zero_i32(value: Option<i32>) -> Option<i32> {
    value.filter(|v| *v != 0)
}

fn non_zero_i64(value: Option<i64>) -> Option<i64> {
    value.filter(|v| *v != 0)
}

fn non_zero_f64(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Build a full image URL from a base, a size token and a relative path.
///
/// Returns `None` when the path is missing or empty.
///
/// ```
/// use reelmatch::metadata::mapper::image_url;
///
/// assert_eq!(
///     image_url("https://image.tmdb.org/t/p", "w500", Some("/abc.jpg")).as_deref(),
///     Some("https://image.tmdb.org/t/p/w500/abc.jpg"),
/// );
/// assert_eq!(image_url("https://image.tmdb.org/t/p", "w500", Some("")), None);
/// ```
pub fn image_url(base: &str, size: &str, path: Option<&str>) -> Option<String> {
    let path = path.map(str::trim).filter(|p| !p.is_empty())?;
    let base = base.trim_end_matches('/');
    let size = if size.is_empty() { "original" } else { size };
    if path.starts_with('/') {
        Some(format!("{base}/{size}{path}"))
    } else {
        Some(format!("{base}/{size}/{path}"))
    }
}

pub fn poster_url(base: &str, path: Option<&str>) -> Option<String> {
    image_url(base, POSTER_SIZE, path)
}

pub fn backdrop_url(base: &str, path: Option<&str>) -> Option<String> {
    image_url(base, BACKDROP_SIZE, path)
}

pub fn profile_url(base: &str, path: Option<&str>) -> Option<String> {
    image_url(base, PROFILE_SIZE, path)
}

// ---------------------------------------------------------------------------
// Movie catalog
// ---------------------------------------------------------------------------

/// Map one movie search result.
pub fn map_search_result(result: &tmdb_types::MovieResult, image_base: &str) -> RecordMetadata {
    RecordMetadata {
        provider: tmdb::PROVIDER_NAME.to_string(),
        external_id: result.id.to_string(),
        title: result.title.clone().unwrap_or_default(),
        original_title: non_empty(result.original_title.as_deref()),
        year: extract_year(result.release_date.as_deref()),
        release_date: parse_date(result.release_date.as_deref()),
        overview: non_empty(result.overview.as_deref()),
        vote_average: non_zero_f64(result.vote_average),
        vote_count: non_zero_i64(result.vote_count),
        popularity: non_zero_f64(result.popularity),
        poster_url: poster_url(image_base, result.poster_path.as_deref()),
        backdrop_url: backdrop_url(image_base, result.backdrop_path.as_deref()),
        ..Default::default()
    }
}

/// Map a full movie detail. Credits are mapped separately with
/// [`map_credits`].
pub fn map_movie(movie: &tmdb_types::Movie, image_base: &str) -> RecordMetadata {
    let mut external_ids = Vec::new();
    if let Some(imdb) = non_empty(movie.imdb_id.as_deref()) {
        external_ids.push(ExternalId::new(tmdb::IMDB_PROVIDER, imdb));
    }

    RecordMetadata {
        provider: tmdb::PROVIDER_NAME.to_string(),
        external_id: movie.id.to_string(),
        title: movie.title.clone().unwrap_or_default(),
        original_title: non_empty(movie.original_title.as_deref()),
        year: extract_year(movie.release_date.as_deref()),
        release_date: parse_date(movie.release_date.as_deref()),
        runtime_minutes: non_zero_i32(movie.runtime),
        overview: non_empty(movie.overview.as_deref()),
        tagline: non_empty(movie.tagline.as_deref()),
        vote_average: non_zero_f64(movie.vote_average),
        vote_count: non_zero_i64(movie.vote_count),
        popularity: non_zero_f64(movie.popularity),
        budget: non_zero_i64(movie.budget),
        revenue: non_zero_i64(movie.revenue),
        poster_url: poster_url(image_base, movie.poster_path.as_deref()),
        backdrop_url: backdrop_url(image_base, movie.backdrop_path.as_deref()),
        studio: movie
            .production_companies
            .iter()
            .find_map(|c| non_empty(c.name.as_deref())),
        collection: movie
            .belongs_to_collection
            .as_ref()
            .and_then(|c| non_empty(c.name.as_deref())),
        genres: movie
            .genres
            .iter()
            .filter_map(|g| non_empty(g.name.as_deref()))
            .collect(),
        credits: Vec::new(),
        external_ids,
        fingerprints: Vec::new(),
    }
}

/// Split a credits payload into cast and crew credits.
///
/// Cast keeps the character and billing order; crew keeps department and job
/// and has no billing order.
pub fn map_credits(credits: &tmdb_types::Credits, image_base: &str) -> Vec<Credit> {
    let cast = credits.cast.iter().map(|c| {
        Credit::Cast(CastCredit {
            person_id: Some(c.id.to_string()),
            name: c.name.clone().unwrap_or_default(),
            character: non_empty(c.character.as_deref()),
            order: c.order,
            profile_path: profile_url(image_base, c.profile_path.as_deref()),
        })
    });

    let crew = credits.crew.iter().map(|c| {
        Credit::Crew(CrewCredit {
            person_id: Some(c.id.to_string()),
            name: c.name.clone().unwrap_or_default(),
            department: non_empty(c.department.as_deref()),
            job: non_empty(c.job.as_deref()),
            profile_path: profile_url(image_base, c.profile_path.as_deref()),
        })
    });

    cast.chain(crew).collect()
}

/// Pick the best-voted poster's relative path.
pub fn best_poster(images: &tmdb_types::Images) -> Option<&str> {
    images
        .posters
        .iter()
        .filter(|i| i.file_path.as_deref().is_some_and(|p| !p.is_empty()))
        .max_by(|a, b| {
            let a = (a.vote_average.unwrap_or(0.0), a.vote_count.unwrap_or(0));
            let b = (b.vote_average.unwrap_or(0.0), b.vote_count.unwrap_or(0));
            a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
        })
        .and_then(|i| i.file_path.as_deref())
}

pub fn map_collection(collection: &tmdb_types::Collection, image_base: &str) -> CollectionMetadata {
    let mut parts: Vec<_> = collection
        .parts
        .iter()
        .map(|p| map_search_result(p, image_base))
        .collect();
    // Undated parts sort last
    parts.sort_by_key(|p| (p.release_date.is_none(), p.release_date));

    CollectionMetadata {
        provider: tmdb::PROVIDER_NAME.to_string(),
        external_id: collection.id.to_string(),
        name: collection.name.clone().unwrap_or_default(),
        overview: non_empty(collection.overview.as_deref()),
        poster_url: poster_url(image_base, collection.poster_path.as_deref()),
        backdrop_url: backdrop_url(image_base, collection.backdrop_path.as_deref()),
        parts,
    }
}

// ---------------------------------------------------------------------------
// Scene catalog
// ---------------------------------------------------------------------------

/// Map a scene. Scene images are already absolute URLs.
pub fn map_scene(scene: &stash::Scene) -> RecordMetadata {
    let date = scene
        .release_date
        .as_deref()
        .filter(|d| !d.is_empty())
        .or(scene.date.as_deref());

    let mut credits: Vec<Credit> = scene
        .performers
        .iter()
        .enumerate()
        .map(|(position, appearance)| {
            Credit::Cast(CastCredit {
                person_id: non_empty(Some(appearance.performer.id.as_str())),
                name: appearance.performer.name.clone().unwrap_or_default(),
                character: non_empty(appearance.as_name.as_deref()),
                order: i32::try_from(position).ok(),
                profile_path: first_image(&appearance.performer.images),
            })
        })
        .collect();

    if let Some(director) = non_empty(scene.director.as_deref()) {
        credits.push(Credit::Crew(CrewCredit {
            name: director,
            department: Some("Directing".to_string()),
            job: Some("Director".to_string()),
            ..Default::default()
        }));
    }

    RecordMetadata {
        provider: stashdb::PROVIDER_NAME.to_string(),
        external_id: scene.id.clone(),
        title: scene.title.clone().unwrap_or_default(),
        year: extract_year(date),
        release_date: parse_date(date),
        runtime_minutes: scene
            .duration
            .filter(|secs| *secs > 0)
            .and_then(|secs| i32::try_from((secs + 30) / 60).ok())
            .and_then(|m| non_zero_i32(Some(m))),
        overview: non_empty(scene.details.as_deref()),
        poster_url: first_image(&scene.images),
        studio: scene
            .studio
            .as_ref()
            .and_then(|s| non_empty(s.name.as_deref())),
        genres: scene
            .tags
            .iter()
            .filter_map(|t| non_empty(t.name.as_deref()))
            .collect(),
        credits,
        fingerprints: map_fingerprints(&scene.fingerprints),
        ..Default::default()
    }
}

/// Map scene fingerprints, keeping the first of each known algorithm.
pub fn map_fingerprints(fingerprints: &[stash::SceneFingerprint]) -> Vec<Fingerprint> {
    let mut out: Vec<Fingerprint> = Vec::new();
    for fp in fingerprints {
        // Unknown algorithms are skipped
        let Ok(algorithm) = fp.algorithm.parse::<FingerprintAlgorithm>() else {
            continue;
        };
        if fp.hash.is_empty() || out.iter().any(|f| f.algorithm == algorithm) {
            continue;
        }
        let mut mapped = Fingerprint::new(algorithm, fp.hash.clone());
        mapped.duration_secs = fp
            .duration
            .filter(|d| *d > 0)
            .and_then(|d| u32::try_from(d).ok());
        out.push(mapped);
    }
    out
}

pub fn map_performer(performer: &stash::Performer) -> PersonMetadata {
    PersonMetadata {
        provider: stashdb::PROVIDER_NAME.to_string(),
        external_id: performer.id.clone(),
        name: performer.name.clone().unwrap_or_default(),
        disambiguation: non_empty(performer.disambiguation.as_deref()),
        aliases: performer
            .aliases
            .iter()
            .filter_map(|a| non_empty(Some(a.as_str())))
            .collect(),
        gender: non_empty(performer.gender.as_deref()),
        birth_date: parse_date(performer.birth_date.as_deref()),
        death_date: parse_date(performer.death_date.as_deref()),
        country: non_empty(performer.country.as_deref()),
        image_url: first_image(&performer.images),
        scene_count: non_zero_i64(performer.scene_count),
    }
}

fn first_image(images: &[stash::Image]) -> Option<String> {
    images.iter().find_map(|i| non_empty(i.url.as_deref()))
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Overwrite a record's descriptive fields with fresh metadata.
///
/// Identity, library, kind, path and fingerprints are left alone. External
/// ids are merged: the provider's own id and any cross-references are
/// inserted or replaced, others are kept. An empty title does not replace the
/// existing one.
pub fn apply_to_record(record: &mut CanonicalRecord, metadata: &RecordMetadata) {
    if !metadata.title.trim().is_empty() {
        record.title = metadata.title.clone();
    }
    record.original_title = metadata.original_title.clone();
    record.year = metadata.year;
    record.release_date = metadata.release_date;
    record.runtime_minutes = metadata.runtime_minutes;
    record.overview = metadata.overview.clone();
    record.tagline = metadata.tagline.clone();
    record.vote_average = metadata.vote_average;
    record.vote_count = metadata.vote_count;
    record.popularity = metadata.popularity;
    record.budget = metadata.budget;
    record.revenue = metadata.revenue;
    record.poster_path = metadata.poster_url.clone();
    record.backdrop_path = metadata.backdrop_url.clone();
    record.studio = metadata.studio.clone();
    record.collection = metadata.collection.clone();
    record.genres = metadata.genres.clone();
    record.credits = metadata.credits.clone();

    record.set_external_id(metadata.provider_id());
    for external in &metadata.external_ids {
        record.set_external_id(external.clone());
    }
}
