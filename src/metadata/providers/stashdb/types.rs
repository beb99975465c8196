//! StashDB GraphQL wire types.

use serde::{Deserialize, Serialize};

/// Request body for a GraphQL POST.
#[derive(Debug, Serialize)]
pub struct GraphqlRequest<'a> {
    pub query: &'a str,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub variables: serde_json::Value,
}

/// Response envelope. `data` may be present alongside `errors`, so it is
/// kept as raw JSON by default and decoded after the errors are checked.
#[derive(Debug, Deserialize)]
pub struct GraphqlResponse<T = serde_json::Value> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlError {
    pub message: String,
    #[serde(default)]
    pub path: Option<Vec<serde_json::Value>>,
}

/// Fingerprint lookup input: `{algorithm, hash, duration}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FingerprintInput {
    pub algorithm: String,
    pub hash: String,
    pub duration: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub id: String,
    pub title: Option<String>,
    pub details: Option<String>,
    pub date: Option<String>,
    pub release_date: Option<String>,
    pub production_date: Option<String>,
    /// Seconds.
    pub duration: Option<i64>,
    pub director: Option<String>,
    pub code: Option<String>,
    pub studio: Option<Studio>,
    pub performers: Vec<PerformerAppearance>,
    pub tags: Vec<Tag>,
    pub images: Vec<Image>,
    pub fingerprints: Vec<SceneFingerprint>,
    pub urls: Vec<Url>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Studio {
    pub id: String,
    pub name: Option<String>,
    pub images: Vec<Image>,
}

/// A performer's appearance in a scene, with the name they were credited as.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PerformerAppearance {
    pub performer: Performer,
    #[serde(rename = "as")]
    pub as_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Performer {
    pub id: String,
    pub name: Option<String>,
    pub disambiguation: Option<String>,
    pub aliases: Vec<String>,
    pub gender: Option<String>,
    pub birth_date: Option<String>,
    pub death_date: Option<String>,
    pub country: Option<String>,
    pub images: Vec<Image>,
    pub scene_count: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Tag {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Image {
    pub id: String,
    pub url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SceneFingerprint {
    pub algorithm: String,
    pub hash: String,
    pub duration: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Url {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// One page of a search.
#[derive(Debug, Clone, Default)]
pub struct QueryPage<T> {
    pub count: i64,
    pub items: Vec<T>,
}

// Per-query `data` shapes.

#[derive(Debug, Deserialize)]
pub(crate) struct FindSceneData {
    #[serde(rename = "findScene")]
    pub find_scene: Option<Scene>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchSceneData {
    #[serde(rename = "searchScene")]
    pub search_scene: SceneSearchPage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SceneSearchPage {
    pub count: i64,
    pub scenes: Vec<Scene>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FindSceneByFingerprintData {
    #[serde(rename = "findSceneByFingerprint", default)]
    pub scenes: Vec<Scene>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FindScenesByFingerprintsData {
    #[serde(rename = "findScenesByFingerprints", default)]
    pub scenes: Vec<Scene>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FindPerformerData {
    #[serde(rename = "findPerformer")]
    pub find_performer: Option<Performer>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchPerformerData {
    #[serde(rename = "searchPerformer")]
    pub search_performer: PerformerSearchPage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PerformerSearchPage {
    pub count: i64,
    pub performers: Vec<Performer>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VersionData {
    pub version: Version,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Version {
    pub version: String,
}
