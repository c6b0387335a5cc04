//! Configuration schema for Consilium.

use serde::{Deserialize, Serialize};

/// Root config for the Consilium gateway.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConsiliumConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub advisor: AdvisorConfig,
}

impl ConsiliumConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> ConsiliumConfigBuilder {
        ConsiliumConfigBuilder::new()
    }

    /// Validate cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), crate::ConfigError> {
        if self.rate_limit.max_requests == 0 {
            return Err(crate::ConfigError::InvalidField {
                path: "rate_limit.max_requests".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.rate_limit.window_secs == 0 {
            return Err(crate::ConfigError::InvalidField {
                path: "rate_limit.window_secs".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.rate_limit.max_sessions == 0 {
            return Err(crate::ConfigError::InvalidField {
                path: "rate_limit.max_sessions".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.history.consult_window == 0 {
            return Err(crate::ConfigError::InvalidField {
                path: "history.consult_window".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.providers.retry.max_attempts == 0 {
            return Err(crate::ConfigError::InvalidField {
                path: "providers.retry.max_attempts".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for assembling a `ConsiliumConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct ConsiliumConfigBuilder {
    config: ConsiliumConfig,
}

impl ConsiliumConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: ConsiliumConfig::default(),
        }
    }

    /// Replace the server configuration.
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.config.server = server;
        self
    }

    /// Replace the rate limit configuration.
    pub fn rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.config.rate_limit = rate_limit;
        self
    }

    /// Replace the history window configuration.
    pub fn history(mut self, history: HistoryConfig) -> Self {
        self.config.history = history;
        self
    }

    /// Replace the provider configuration.
    pub fn providers(mut self, providers: ProvidersConfig) -> Self {
        self.config.providers = providers;
        self
    }

    /// Replace the persistence configuration.
    pub fn persistence(mut self, persistence: PersistenceConfig) -> Self {
        self.config.persistence = persistence;
        self
    }

    /// Replace the advisor configuration.
    pub fn advisor(mut self, advisor: AdvisorConfig) -> Self {
        self.config.advisor = advisor;
        self
    }

    /// Finalize and return the built `ConsiliumConfig`.
    pub fn build(self) -> ConsiliumConfig {
        self.config
    }
}

/// HTTP server binding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

/// Per-session admission window configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

fn default_max_requests() -> usize {
    10
}

fn default_window_secs() -> u64 {
    60
}

fn default_max_sessions() -> usize {
    10_000
}

/// History window caps for prompt context and the history endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_consult_window")]
    pub consult_window: usize,
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            consult_window: default_consult_window(),
            fetch_limit: default_fetch_limit(),
        }
    }
}

fn default_consult_window() -> usize {
    20
}

fn default_fetch_limit() -> usize {
    100
}

/// Upstream provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Provider used when a request does not name one.
    #[serde(default = "default_provider")]
    pub default: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub grok: GrokConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            default: default_provider(),
            request_timeout_secs: default_request_timeout_secs(),
            retry: RetryConfig::default(),
            gemini: GeminiConfig::default(),
            grok: GrokConfig::default(),
        }
    }
}

fn default_provider() -> String {
    "grok".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Backoff policy applied to throttled upstream calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

fn default_max_attempts() -> usize {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

/// Gemini upstream configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key; usually supplied via the GEMINI_API_KEY environment variable.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            base_url: default_gemini_base_url(),
        }
    }
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash-latest".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

/// Grok upstream configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrokConfig {
    /// API key; usually supplied via the GROK_API_KEY environment variable.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_grok_model")]
    pub model: String,
    #[serde(default = "default_grok_base_url")]
    pub base_url: String,
}

impl Default for GrokConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_grok_model(),
            base_url: default_grok_base_url(),
        }
    }
}

fn default_grok_model() -> String {
    "grok-4-fast-reasoning".to_string()
}

fn default_grok_base_url() -> String {
    "https://api.x.ai/v1".to_string()
}

/// Consultation store configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PersistenceConfig {
    /// Root directory for consultation records; defaults under the home dir.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub on_store_failure: StoreFailurePolicy,
}

/// What to do when persisting a record fails after a successful provider call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StoreFailurePolicy {
    /// Surface the store error; the generated reply is lost.
    #[default]
    Discard,
    /// Return the record to the caller and only log the store failure.
    ReturnUnrecorded,
}

/// Advisor persona and legacy-data configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// System instruction sent to every provider.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Provider identifier assumed for stored records that predate the field.
    #[serde(default = "default_legacy_provider")]
    pub legacy_provider: String,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            legacy_provider: default_legacy_provider(),
        }
    }
}

fn default_system_prompt() -> String {
    "You are a health information advisor providing general health education \
     and guidance. You do not diagnose conditions or prescribe medication. \
     Always recommend consulting a licensed healthcare provider for proper \
     diagnosis and treatment, and advise emergency care for severe symptoms."
        .to_string()
}

fn default_legacy_provider() -> String {
    "gemini".to_string()
}
