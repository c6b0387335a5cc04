//! Configuration schema and loading for Consilium.

pub mod error;
pub mod loader;
pub mod model;

/// Config error type.
pub use error::ConfigError;
/// File and environment loader.
pub use loader::{load_config, LoadOptions};
/// Configuration schema.
pub use model::{
    AdvisorConfig, ConsiliumConfig, ConsiliumConfigBuilder, GeminiConfig, GrokConfig,
    HistoryConfig, PersistenceConfig, ProvidersConfig, RateLimitConfig, RetryConfig,
    ServerConfig, StoreFailurePolicy,
};
