//! Failure taxonomy for completion providers.

use thiserror::Error;

/// Errors returned by a provider call, after provider-owned retries.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// No credential is available for this provider.
    #[error("provider is not configured")]
    Unconfigured,
    /// Upstream throttled the request and retries were exhausted.
    #[error("upstream rate limit exceeded")]
    RateLimited,
    /// Upstream did not produce a complete reply within the bound.
    #[error("upstream request timed out")]
    Timeout,
    /// Any other upstream-signaled failure.
    #[error("upstream error: {0}")]
    Upstream(String),
}
