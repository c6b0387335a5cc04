//! Application state wiring from config to collaborators.

use anyhow::{Context, anyhow};
use consilium_config::ConsiliumConfig;
use consilium_core::{ConsultationOrchestrator, JsonlConsultationStore};
use consilium_providers::{
    GeminiProvider, GrokProvider, ProviderKind, ProviderRegistry, RetryPolicy,
};
use directories::BaseDirs;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Directory under the home dir holding gateway data.
const DATA_DIR: &str = ".consilium";
/// Subdirectory holding consultation records.
const CONSULTATIONS_DIR: &str = "consultations";

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    /// The consultation orchestrator.
    pub orchestrator: Arc<ConsultationOrchestrator>,
}

/// Build the full collaborator graph from config.
///
/// Provider name strings are parsed here, at the boundary, so invalid config
/// stops startup instead of surfacing per-request.
pub fn build_state(config: ConsiliumConfig) -> anyhow::Result<AppState> {
    let config = Arc::new(config);
    let default_kind = ProviderKind::parse(&config.providers.default)
        .ok_or_else(|| anyhow!("unknown default provider: {}", config.providers.default))?;
    let legacy_kind = ProviderKind::parse(&config.advisor.legacy_provider)
        .ok_or_else(|| anyhow!("unknown legacy provider: {}", config.advisor.legacy_provider))?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.providers.request_timeout_secs))
        .build()
        .context("building upstream HTTP client")?;
    let retry = RetryPolicy {
        max_attempts: config.providers.retry.max_attempts,
        base_delay: Duration::from_millis(config.providers.retry.base_delay_ms),
    };

    let registry = ProviderRegistry::new(default_kind);
    if config.providers.gemini.api_key.is_none() {
        warn!("GEMINI_API_KEY not configured");
    }
    registry.insert(Arc::new(GeminiProvider::new(
        client.clone(),
        config.providers.gemini.api_key.clone(),
        config.providers.gemini.model.clone(),
        config.providers.gemini.base_url.clone(),
        retry,
    )));
    if config.providers.grok.api_key.is_none() {
        warn!("GROK_API_KEY not configured");
    }
    registry.insert(Arc::new(GrokProvider::new(
        client,
        config.providers.grok.api_key.clone(),
        config.providers.grok.model.clone(),
        config.providers.grok.base_url.clone(),
        retry,
    )));

    let store_root = resolve_store_root(config.persistence.path.as_deref());
    info!("consultation store root: {}", store_root.display());
    let store = Arc::new(JsonlConsultationStore::new(store_root)?);

    let orchestrator = Arc::new(ConsultationOrchestrator::new(
        config,
        registry,
        store,
        legacy_kind,
    ));
    Ok(AppState { orchestrator })
}

/// Resolve the store root from config, falling back under the home dir.
fn resolve_store_root(configured: Option<&str>) -> PathBuf {
    if let Some(path) = configured {
        return PathBuf::from(path);
    }
    if let Some(dirs) = BaseDirs::new() {
        return dirs.home_dir().join(DATA_DIR).join(CONSULTATIONS_DIR);
    }
    PathBuf::from(DATA_DIR).join(CONSULTATIONS_DIR)
}
