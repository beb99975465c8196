//! StashDB content provider for scene libraries.

pub mod client;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use reelmatch_common::{ContentKind, Fingerprint, Result};
use tokio_util::sync::CancellationToken;

pub use client::StashDbClient;

use crate::metadata::mapper;
use crate::metadata::provider::{ContentProvider, PersonMetadata, RecordMetadata};

/// Provider name stored in external ids.
pub const PROVIDER_NAME: &str = "stashdb";

/// Page size for title searches during matching.
pub const SEARCH_PAGE_SIZE: u32 = 25;

/// Scene provider backed by StashDB.
#[derive(Debug, Clone)]
pub struct StashDbProvider {
    client: Arc<StashDbClient>,
}

impl StashDbProvider {
    pub fn new(config: &crate::config::StashDbConfig) -> Result<Self> {
        Ok(Self::from_client(Arc::new(StashDbClient::new(config)?)))
    }

    pub fn from_client(client: Arc<StashDbClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &StashDbClient {
        &self.client
    }

    pub async fn fetch_performer(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<PersonMetadata> {
        let performer = self.client.get_performer(id, cancel).await?;
        Ok(mapper::map_performer(&performer))
    }

    pub async fn search_performers(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<PersonMetadata>> {
        let page = self
            .client
            .search_performers(name, 1, SEARCH_PAGE_SIZE, cancel)
            .await?;
        Ok(page.items.iter().map(mapper::map_performer).collect())
    }
}

#[async_trait]
impl ContentProvider for StashDbProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn kind(&self) -> ContentKind {
        ContentKind::Scene
    }

    fn is_available(&self) -> bool {
        self.client.is_configured()
    }

    async fn fetch_by_external_id(
        &self,
        external_id: &str,
        cancel: &CancellationToken,
    ) -> Result<RecordMetadata> {
        let scene = self.client.get_scene(external_id, cancel).await?;
        Ok(mapper::map_scene(&scene))
    }

    async fn match_by_fingerprints(
        &self,
        fingerprints: &[Fingerprint],
        cancel: &CancellationToken,
    ) -> Result<Vec<RecordMetadata>> {
        let scenes = match fingerprints {
            [] => return Ok(Vec::new()),
            [single] => self.client.find_scene_by_fingerprint(single, cancel).await?,
            many => self.client.find_scenes_by_fingerprints(many, cancel).await?,
        };
        Ok(scenes.iter().map(mapper::map_scene).collect())
    }

    /// Scene search by title. The catalog has no year filter; the matcher
    /// applies the year itself.
    async fn match_by_heuristics(
        &self,
        title: &str,
        _year: Option<i32>,
        cancel: &CancellationToken,
    ) -> Result<Vec<RecordMetadata>> {
        let page = self
            .client
            .search_scenes(title, 1, SEARCH_PAGE_SIZE, cancel)
            .await?;
        Ok(page.items.iter().map(mapper::map_scene).collect())
    }
}
