//! Core type definitions shared by the scanner, providers and persistence.
//!
//! Enums serialize in lowercase except [`FingerprintAlgorithm`], which uses
//! the uppercase tags the scene catalog expects on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Kind of content a library holds. Selects which catalog resolves its files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Feature films, resolved against the REST movie catalog.
    Movie,
    /// Adult scenes, resolved against the GraphQL scene catalog.
    Scene,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::Scene => write!(f, "scene"),
        }
    }
}

impl FromStr for ContentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movie" | "movies" => Ok(Self::Movie),
            "scene" | "scenes" => Ok(Self::Scene),
            other => Err(Error::validation(format!("unknown content kind: {other}"))),
        }
    }
}

/// Fingerprint hashing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FingerprintAlgorithm {
    /// Perceptual hash of sampled frames.
    Phash,
    /// OpenSubtitles-style size + head/tail content hash.
    Oshash,
    /// MD5 of the full file contents.
    Md5,
}

impl fmt::Display for FingerprintAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Phash => write!(f, "PHASH"),
            Self::Oshash => write!(f, "OSHASH"),
            Self::Md5 => write!(f, "MD5"),
        }
    }
}

impl FromStr for FingerprintAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PHASH" => Ok(Self::Phash),
            "OSHASH" => Ok(Self::Oshash),
            "MD5" => Ok(Self::Md5),
            other => Err(Error::validation(format!(
                "unknown fingerprint algorithm: {other}"
            ))),
        }
    }
}

/// An opaque content-derived hash used to identify a file independent of
/// its name.
///
/// `duration_secs` corroborates a match but is never a match key on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    pub algorithm: FingerprintAlgorithm,
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
}

impl Fingerprint {
    pub fn new(algorithm: FingerprintAlgorithm, hash: impl Into<String>) -> Self {
        Self {
            algorithm,
            hash: hash.into(),
            duration_secs: None,
        }
    }

    #[must_use]
    pub fn with_duration(mut self, secs: u32) -> Self {
        self.duration_secs = Some(secs);
        self
    }
}

/// A (provider name, provider id) pair linking a record to a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalId {
    pub provider: String,
    pub id: String,
}

impl ExternalId {
    pub fn new(provider: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.id)
    }
}
