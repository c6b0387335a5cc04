//! Kind-keyed provider registry with a configured default.

use crate::error::ProviderError;
use crate::provider::{CompletionProvider, ProviderKind};
use log::info;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Registered provider set; adding a backend never touches the orchestrator.
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: Arc<RwLock<HashMap<ProviderKind, Arc<dyn CompletionProvider>>>>,
    default_kind: ProviderKind,
}

impl ProviderRegistry {
    /// Create an empty registry with the given default kind.
    pub fn new(default_kind: ProviderKind) -> Self {
        Self {
            providers: Arc::new(RwLock::new(HashMap::new())),
            default_kind,
        }
    }

    /// Register a provider under its own kind.
    pub fn insert(&self, provider: Arc<dyn CompletionProvider>) {
        info!("registering provider (provider={})", provider.kind());
        self.providers.write().insert(provider.kind(), provider);
    }

    /// Return the configured default kind.
    pub fn default_kind(&self) -> ProviderKind {
        self.default_kind
    }

    /// Resolve a requested kind (or the default) to a registered provider.
    pub fn resolve(
        &self,
        choice: Option<ProviderKind>,
    ) -> Result<Arc<dyn CompletionProvider>, ProviderError> {
        let kind = choice.unwrap_or(self.default_kind);
        self.providers
            .read()
            .get(&kind)
            .cloned()
            .ok_or(ProviderError::Unconfigured)
    }

    /// Snapshot each registered kind with its credential status.
    pub fn configured_kinds(&self) -> Vec<(ProviderKind, bool)> {
        let mut kinds: Vec<(ProviderKind, bool)> = self
            .providers
            .read()
            .values()
            .map(|provider| (provider.kind(), provider.is_configured()))
            .collect();
        kinds.sort_by_key(|(kind, _)| kind.as_str());
        kinds
    }
}
