//! Consultation orchestration for Consilium.
//!
//! Composes the session rate limiter, history reconstructor, provider
//! registry, and consultation store into the consult/fetch-history/health
//! operations exposed by the gateway.

pub mod error;
pub mod history;
pub mod orchestrator;
pub mod rate_limit;
pub mod store;
pub mod types;

/// Core error type.
pub use error::ConsultError;
/// History reconstruction over stored records.
pub use history::HistoryReconstructor;
/// Main orchestration façade.
pub use orchestrator::ConsultationOrchestrator;
/// Per-session sliding-window admission control.
pub use rate_limit::SessionRateLimiter;
/// Consultation store interface and default implementation.
pub use store::{ConsultationStore, JsonlConsultationStore, StoreError};
/// Core data types.
pub use types::{
    ConsultationRecord, ConsultationRequest, Gender, HealthStatus, PatientContext,
    ProviderStatus, SessionHistory,
};
