//! StashDB GraphQL client.
//!
//! One POST endpoint, credential in the `ApiKey` header. Unlike the TMDB
//! client this does no rate limiting or caching of its own.

use std::time::Duration;

use reelmatch_common::{Error, Fingerprint, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::types::{
    FindPerformerData, FindSceneByFingerprintData, FindSceneData, FindScenesByFingerprintsData,
    FingerprintInput, GraphqlRequest, GraphqlResponse, Performer, QueryPage, Scene,
    SearchPerformerData, SearchSceneData, VersionData,
};
use crate::config::StashDbConfig;
use crate::metadata::http::{build_client, send_with_retry, RetryPolicy};

const API_KEY_HEADER: &str = "ApiKey";

const SCENE_FIELDS: &str = r#"
    id
    title
    details
    date
    release_date
    production_date
    duration
    director
    code
    studio { id name images { id url width height } }
    performers {
        performer { id name disambiguation aliases gender birth_date country images { id url width height } }
        as
    }
    tags { id name description }
    images { id url width height }
    fingerprints { algorithm hash duration }
    urls { url type }
"#;

const PERFORMER_FIELDS: &str = r#"
    id
    name
    disambiguation
    aliases
    gender
    birth_date
    death_date
    country
    images { id url width height }
    scene_count
"#;

/// Low-level StashDB client returning wire types.
pub struct StashDbClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    retry: RetryPolicy,
}

impl StashDbClient {
    pub fn new(config: &StashDbConfig) -> Result<Self> {
        Ok(Self {
            http: build_client(Duration::from_secs(config.timeout_secs))?,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            retry: RetryPolicy {
                max_retries: config.max_retries,
                backoff: Duration::from_millis(config.retry_backoff_ms),
                // 429 is reported to the caller as RateLimited
                retry_rate_limited: false,
            },
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Check the endpoint is reachable and answering queries. Returns the
    /// server version.
    pub async fn ping(&self, cancel: &CancellationToken) -> Result<String> {
        let data: VersionData = self
            .query("Version", "query Version { version { version } }", serde_json::Value::Null, cancel)
            .await?;
        Ok(data.version.version)
    }

    pub async fn get_scene(&self, id: &str, cancel: &CancellationToken) -> Result<Scene> {
        let query = format!("query FindScene($id: ID!) {{ findScene(id: $id) {{ {SCENE_FIELDS} }} }}");
        let data: FindSceneData = self
            .query("FindScene", &query, json!({ "id": id }), cancel)
            .await?;
        data.find_scene.ok_or_else(|| Error::not_found("scene", id))
    }

    pub async fn search_scenes(
        &self,
        term: &str,
        page: u32,
        per_page: u32,
        cancel: &CancellationToken,
    ) -> Result<QueryPage<Scene>> {
        let query = format!(
            "query SearchScenes($term: String!, $page: Int!, $per_page: Int!) {{ \
             searchScene(term: $term, page: $page, per_page: $per_page) {{ count scenes {{ {SCENE_FIELDS} }} }} }}"
        );
        let data: SearchSceneData = self
            .query(
                "SearchScenes",
                &query,
                json!({ "term": term, "page": page, "per_page": per_page }),
                cancel,
            )
            .await?;
        Ok(QueryPage {
            count: data.search_scene.count,
            items: data.search_scene.scenes,
        })
    }

    pub async fn find_scene_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
        cancel: &CancellationToken,
    ) -> Result<Vec<Scene>> {
        let query = format!(
            "query FindSceneByFingerprint($fingerprint: FingerprintQueryInput!) {{ \
             findSceneByFingerprint(fingerprint: $fingerprint) {{ {SCENE_FIELDS} }} }}"
        );
        let data: FindSceneByFingerprintData = self
            .query(
                "FindSceneByFingerprint",
                &query,
                json!({ "fingerprint": fingerprint_input(fingerprint) }),
                cancel,
            )
            .await?;
        Ok(data.scenes)
    }

    /// Scenes matching any of the given fingerprints.
    pub async fn find_scenes_by_fingerprints(
        &self,
        fingerprints: &[Fingerprint],
        cancel: &CancellationToken,
    ) -> Result<Vec<Scene>> {
        let query = format!(
            "query FindScenesByFingerprints($fingerprints: [FingerprintQueryInput!]!) {{ \
             findScenesByFingerprints(fingerprints: $fingerprints) {{ {SCENE_FIELDS} }} }}"
        );
        let inputs: Vec<_> = fingerprints.iter().map(fingerprint_input).collect();
        let data: FindScenesByFingerprintsData = self
            .query(
                "FindScenesByFingerprints",
                &query,
                json!({ "fingerprints": inputs }),
                cancel,
            )
            .await?;
        Ok(data.scenes)
    }

    pub async fn get_performer(&self, id: &str, cancel: &CancellationToken) -> Result<Performer> {
        let query = format!(
            "query FindPerformer($id: ID!) {{ findPerformer(id: $id) {{ {PERFORMER_FIELDS} }} }}"
        );
        let data: FindPerformerData = self
            .query("FindPerformer", &query, json!({ "id": id }), cancel)
            .await?;
        data.find_performer
            .ok_or_else(|| Error::not_found("performer", id))
    }

    pub async fn search_performers(
        &self,
        term: &str,
        page: u32,
        per_page: u32,
        cancel: &CancellationToken,
    ) -> Result<QueryPage<Performer>> {
        let query = format!(
            "query SearchPerformers($term: String!, $page: Int!, $per_page: Int!) {{ \
             searchPerformer(term: $term, page: $page, per_page: $per_page) {{ count performers {{ {PERFORMER_FIELDS} }} }} }}"
        );
        let data: SearchPerformerData = self
            .query(
                "SearchPerformers",
                &query,
                json!({ "term": term, "page": page, "per_page": per_page }),
                cancel,
            )
            .await?;
        Ok(QueryPage {
            count: data.search_performer.count,
            items: data.search_performer.performers,
        })
    }

    /// Execute one GraphQL operation.
    ///
    /// Status mapping: 401/403 are `Unauthorized`, 429 is `RateLimited`, any
    /// other non-200 is an API error carrying the raw body. A 200 whose
    /// envelope has errors fails with the first of them.
    async fn query<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: serde_json::Value,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let body = GraphqlRequest { query, variables };

        debug!(operation, "StashDB query");
        let resp = send_with_retry(operation, self.retry, None, cancel, || {
            let req = self
                .http
                .post(&self.endpoint)
                .header(reqwest::header::ACCEPT, "application/json")
                .json(&body);
            if self.api_key.is_empty() {
                req
            } else {
                req.header(API_KEY_HEADER, &self.api_key)
            }
        })
        .await?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| Error::Unavailable(format!("reading {operation} response: {e}")))?;

        match status {
            StatusCode::OK => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(Error::Unauthorized(format!("stashdb rejected credentials ({status})")));
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(Error::RateLimited("stashdb rate limited".to_string()));
            }
            _ => return Err(Error::api(status.as_u16(), text)),
        }

        // Partial data may accompany errors; it is only decoded once the
        // envelope is known to be error free.
        let envelope: GraphqlResponse = serde_json::from_str(&text)
            .map_err(|e| Error::decode(format!("{operation}: {e}")))?;

        if let Some(first) = envelope.errors.and_then(|errs| errs.into_iter().next()) {
            return Err(Error::Graphql(first.message));
        }

        let data = envelope
            .data
            .ok_or_else(|| Error::decode(format!("{operation}: response has no data")))?;
        serde_json::from_value(data).map_err(|e| Error::decode(format!("{operation}: {e}")))
    }
}

impl std::fmt::Debug for StashDbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StashDbClient")
            .field("endpoint", &self.endpoint)
            .field("configured", &self.is_configured())
            .finish_non_exhaustive()
    }
}

fn fingerprint_input(fp: &Fingerprint) -> FingerprintInput {
    FingerprintInput {
        algorithm: fp.algorithm.to_string(),
        hash: fp.hash.clone(),
        duration: fp.duration_secs.unwrap_or(0),
    }
}
