//! Error types for the core orchestration crate.

use crate::store::StoreError;
use consilium_providers::ProviderError;
use thiserror::Error;

/// Errors returned by consultation operations.
#[derive(Debug, Error)]
pub enum ConsultError {
    /// Malformed or out-of-bounds input, rejected before any side effect.
    #[error("invalid request: {0}")]
    Validation(String),
    /// The session exceeded its admission window.
    #[error("too many requests for this session")]
    TooManyRequests,
    /// A provider call failed after provider-owned retries.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// The store could not accept or produce records.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
