//! Provider registry for resolving a [`ContentProvider`] by content kind or
//! by name.
//!
//! Libraries pick their provider by [`ContentKind`]; re-enrichment picks it
//! by the provider name stored in a record's external ids.

use std::sync::Arc;

use reelmatch_common::{ContentKind, Error, Result};

use super::provider::ContentProvider;

/// A registry that manages the configured [`ContentProvider`]s.
///
/// Providers are stored in registration order. When more than one provider
/// serves a kind, the first *available* one is preferred.
///
/// # Examples
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use reelmatch::metadata::registry::ProviderRegistry;
///
/// let mut registry = ProviderRegistry::new();
/// registry.register(Arc::new(tmdb_provider));
///
/// let provider = registry.require_kind(ContentKind::Movie)?;
/// ```
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn ContentProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry with no providers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider.
    pub fn register(&mut self, provider: Arc<dyn ContentProvider>) {
        self.providers.push(provider);
    }

    /// All providers that currently have credentials configured.
    pub fn available(&self) -> Vec<Arc<dyn ContentProvider>> {
        self.providers
            .iter()
            .filter(|p| p.is_available())
            .cloned()
            .collect()
    }

    /// Provider for a content kind: the first available one, otherwise the
    /// first registered one.
    pub fn for_kind(&self, kind: ContentKind) -> Option<Arc<dyn ContentProvider>> {
        let mut of_kind = self.providers.iter().filter(|p| p.kind() == kind);
        let first = of_kind.clone().next().cloned();
        of_kind.find(|p| p.is_available()).cloned().or(first)
    }

    /// Look up a provider by its [`ContentProvider::name`].
    pub fn get(&self, name: &str) -> Option<Arc<dyn ContentProvider>> {
        self.providers.iter().find(|p| p.name() == name).cloned()
    }

    /// Like [`for_kind`](Self::for_kind), but a missing provider is an error.
    pub fn require_kind(&self, kind: ContentKind) -> Result<Arc<dyn ContentProvider>> {
        self.for_kind(kind)
            .ok_or_else(|| Error::validation(format!("no provider registered for {kind} content")))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::provider::RecordMetadata;
    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    /// A minimal stub provider used for testing.
    struct StubProvider {
        provider_name: &'static str,
        kind: ContentKind,
        available: bool,
    }

    #[async_trait]
    impl ContentProvider for StubProvider {
        fn name(&self) -> &'static str {
            self.provider_name
        }

        fn kind(&self) -> ContentKind {
            self.kind
        }

        fn is_available(&self) -> bool {
            self.available
        }

        async fn fetch_by_external_id(
            &self,
            external_id: &str,
            _cancel: &CancellationToken,
        ) -> Result<RecordMetadata> {
            Err(Error::not_found("stub", external_id))
        }

        async fn match_by_heuristics(
            &self,
            _title: &str,
            _year: Option<i32>,
            _cancel: &CancellationToken,
        ) -> Result<Vec<RecordMetadata>> {
            Ok(Vec::new())
        }
    }

    fn stub(name: &'static str, kind: ContentKind, available: bool) -> Arc<dyn ContentProvider> {
        Arc::new(StubProvider {
            provider_name: name,
            kind,
            available,
        })
    }

    #[test]
    fn empty_registry() {
        let registry = ProviderRegistry::new();
        assert!(registry.available().is_empty());
        assert!(registry.for_kind(ContentKind::Movie).is_none());
        assert!(registry.get("tmdb").is_none());
        assert!(matches!(
            registry.require_kind(ContentKind::Scene),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = ProviderRegistry::new();
        registry.register(stub("tmdb", ContentKind::Movie, true));
        registry.register(stub("stashdb", ContentKind::Scene, false));

        assert_eq!(registry.available().len(), 1);
        assert_eq!(registry.for_kind(ContentKind::Movie).unwrap().name(), "tmdb");
        // Registered but not available is still returned for its kind
        assert_eq!(registry.for_kind(ContentKind::Scene).unwrap().name(), "stashdb");
        assert!(registry.get("stashdb").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.names(), vec!["tmdb", "stashdb"]);
    }

    #[test]
    fn kind_prefers_first_available() {
        let mut registry = ProviderRegistry::new();
        registry.register(stub("offline", ContentKind::Movie, false));
        registry.register(stub("online", ContentKind::Movie, true));

        assert_eq!(registry.for_kind(ContentKind::Movie).unwrap().name(), "online");
    }
}
