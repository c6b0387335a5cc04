//! Main orchestration façade: admits, reconstructs, dispatches, persists.

use crate::error::ConsultError;
use crate::history::HistoryReconstructor;
use crate::rate_limit::SessionRateLimiter;
use crate::store::ConsultationStore;
use crate::types::{
    ConsultationRecord, ConsultationRequest, HealthStatus, PatientContext, ProviderStatus,
    SessionHistory,
};
use chrono::Utc;
use consilium_config::{ConsiliumConfig, StoreFailurePolicy};
use consilium_providers::{ProviderKind, ProviderRegistry};
use log::{debug, error, info, warn};
use std::sync::Arc;
use uuid::Uuid;

/// Maximum patient message length in characters.
const MAX_MESSAGE_CHARS: usize = 2000;
/// Maximum session id length in characters.
const MAX_SESSION_ID_CHARS: usize = 100;
/// Maximum accepted patient age.
const MAX_AGE: u8 = 150;
/// Maximum location length in characters.
const MAX_LOCATION_CHARS: usize = 100;

/// Composes the rate limiter, history reconstructor, provider registry, and
/// consultation store into the gateway's operations.
pub struct ConsultationOrchestrator {
    config: Arc<ConsiliumConfig>,
    rate_limiter: SessionRateLimiter,
    history: HistoryReconstructor,
    registry: ProviderRegistry,
    store: Arc<dyn ConsultationStore>,
}

impl ConsultationOrchestrator {
    /// Construct an orchestrator over already-wired collaborators.
    ///
    /// `legacy_provider` is the kind assumed for stored records that predate
    /// the provider field; the caller parses it out of config at startup.
    pub fn new(
        config: Arc<ConsiliumConfig>,
        registry: ProviderRegistry,
        store: Arc<dyn ConsultationStore>,
        legacy_provider: ProviderKind,
    ) -> Self {
        info!(
            "initializing orchestrator (default_provider={}, consult_window={})",
            registry.default_kind(),
            config.history.consult_window
        );
        let rate_limiter = SessionRateLimiter::new(&config.rate_limit);
        let history = HistoryReconstructor::new(store.clone(), legacy_provider);
        Self {
            config,
            rate_limiter,
            history,
            registry,
            store,
        }
    }

    /// Handle one consultation submission end to end.
    ///
    /// Each step is a hard precondition for the next: validation, admission,
    /// history reconstruction, contextualization, provider dispatch,
    /// persistence, and finally the record itself.
    pub async fn handle(
        &self,
        request: ConsultationRequest,
    ) -> Result<ConsultationRecord, ConsultError> {
        let message = validate(&request)?;
        let session_id = request.session_id;

        if !self.rate_limiter.admit(&session_id) {
            warn!("session over admission window (session_id={})", session_id);
            return Err(ConsultError::TooManyRequests);
        }

        let history = self
            .history
            .load(&session_id, self.config.history.consult_window)
            .await?;
        let contextualized = contextualize(&message, request.patient_info.as_ref());

        let provider = self.registry.resolve(request.ai_provider)?;
        debug!(
            "dispatching consultation (session_id={}, provider={}, history_turns={})",
            session_id,
            provider.kind(),
            history.len()
        );
        let advisor_response = provider
            .complete(
                &self.config.advisor.system_prompt,
                &history,
                &contextualized,
            )
            .await?;

        let record = ConsultationRecord {
            id: Uuid::new_v4(),
            session_id: session_id.clone(),
            patient_message: message,
            advisor_response,
            timestamp: Utc::now(),
            patient_info: request.patient_info,
            ai_provider: provider.kind(),
        };

        if let Err(err) = self.store.insert(&record).await {
            match self.config.persistence.on_store_failure {
                StoreFailurePolicy::Discard => {
                    error!(
                        "discarding reply after store failure (session_id={}, error={})",
                        session_id, err
                    );
                    return Err(err.into());
                }
                StoreFailurePolicy::ReturnUnrecorded => {
                    error!(
                        "returning unrecorded consultation after store failure \
                         (session_id={}, error={})",
                        session_id, err
                    );
                }
            }
        }

        info!(
            "consultation completed (session_id={}, provider={})",
            session_id, record.ai_provider
        );
        Ok(record)
    }

    /// Fetch normalized history for a session; unknown ids yield empty.
    pub async fn fetch_history(&self, session_id: &str) -> Result<SessionHistory, ConsultError> {
        if !is_valid_session_id(session_id) {
            debug!("history requested for unusable session id");
            return Ok(SessionHistory {
                session_id: session_id.to_string(),
                consultations: Vec::new(),
            });
        }
        let consultations = self
            .history
            .load_records(session_id, self.config.history.fetch_limit)
            .await?;
        Ok(SessionHistory {
            session_id: session_id.to_string(),
            consultations,
        })
    }

    /// Report collaborator availability without failing.
    pub async fn health(&self) -> HealthStatus {
        let store_reachable = self.store.ping().await.is_ok();
        let providers = self
            .registry
            .configured_kinds()
            .into_iter()
            .map(|(kind, configured)| ProviderStatus { kind, configured })
            .collect();
        HealthStatus {
            store_reachable,
            providers,
        }
    }
}

/// Validate a submission, returning the trimmed message.
fn validate(request: &ConsultationRequest) -> Result<String, ConsultError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ConsultError::Validation(
            "message cannot be empty".to_string(),
        ));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ConsultError::Validation(format!(
            "message exceeds {MAX_MESSAGE_CHARS} characters"
        )));
    }
    if !is_valid_session_id(&request.session_id) {
        return Err(ConsultError::Validation(
            "session_id must be 1-100 characters of [A-Za-z0-9._-]".to_string(),
        ));
    }
    if let Some(patient_info) = &request.patient_info {
        validate_patient_info(patient_info)?;
    }
    Ok(message.to_string())
}

/// Check session id length and charset.
///
/// The charset keeps opaque ids directly usable as store file stems.
fn is_valid_session_id(session_id: &str) -> bool {
    !session_id.is_empty()
        && session_id.chars().count() <= MAX_SESSION_ID_CHARS
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Validate patient context bounds.
fn validate_patient_info(patient_info: &PatientContext) -> Result<(), ConsultError> {
    if let Some(age) = patient_info.age
        && age > MAX_AGE
    {
        return Err(ConsultError::Validation(format!(
            "age must be at most {MAX_AGE}"
        )));
    }
    if let Some(location) = &patient_info.location
        && location.chars().count() > MAX_LOCATION_CHARS
    {
        return Err(ConsultError::Validation(format!(
            "location exceeds {MAX_LOCATION_CHARS} characters"
        )));
    }
    Ok(())
}

/// Prepend the context line to the framed message when context is present.
fn contextualize(message: &str, patient_info: Option<&PatientContext>) -> String {
    match patient_info.and_then(PatientContext::summary) {
        Some(line) => format!("{line}\n\nUser asks: {message}"),
        None => format!("User asks: {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::{contextualize, is_valid_session_id, validate};
    use crate::types::{ConsultationRequest, Gender, PatientContext};
    use pretty_assertions::assert_eq;

    fn request(message: &str, session_id: &str) -> ConsultationRequest {
        ConsultationRequest {
            message: message.to_string(),
            session_id: session_id.to_string(),
            patient_info: None,
            ai_provider: None,
        }
    }

    #[test]
    fn validate_trims_and_accepts() {
        let message = validate(&request("  hello  ", "s1")).expect("valid");
        assert_eq!(message, "hello".to_string());
    }

    #[test]
    fn validate_rejects_blank_message() {
        let err = validate(&request("   ", "s1")).expect_err("blank");
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn validate_rejects_oversized_message() {
        let err = validate(&request(&"x".repeat(2001), "s1")).expect_err("too long");
        assert!(err.to_string().contains("2000"));
    }

    #[test]
    fn validate_rejects_bad_session_ids() {
        assert_eq!(is_valid_session_id("session-1.a_b"), true);
        assert_eq!(is_valid_session_id(""), false);
        assert_eq!(is_valid_session_id(&"s".repeat(101)), false);
        assert_eq!(is_valid_session_id("../escape"), false);
        assert_eq!(is_valid_session_id("has space"), false);
    }

    #[test]
    fn validate_rejects_out_of_bounds_age() {
        let mut req = request("hello", "s1");
        req.patient_info = Some(PatientContext {
            age: Some(151),
            gender: None,
            location: None,
        });
        let err = validate(&req).expect_err("age");
        assert!(err.to_string().contains("150"));
    }

    #[test]
    fn contextualize_without_context_frames_message() {
        assert_eq!(
            contextualize("I have a headache", None),
            "User asks: I have a headache".to_string()
        );
    }

    #[test]
    fn contextualize_prepends_single_context_line() {
        let context = PatientContext {
            age: Some(28),
            gender: Some(Gender::Male),
            location: Some("Tamale".to_string()),
        };
        assert_eq!(
            contextualize("I feel dizzy", Some(&context)),
            "Context - Age: 28, Gender: male, Location: Tamale\n\nUser asks: I feel dizzy"
                .to_string()
        );
    }

    #[test]
    fn contextualize_ignores_empty_context() {
        let context = PatientContext {
            age: None,
            gender: None,
            location: None,
        };
        assert_eq!(
            contextualize("hello", Some(&context)),
            "User asks: hello".to_string()
        );
    }
}
