//! End-to-end orchestrator behavior over real and scripted collaborators.

use consilium_config::{ConsiliumConfig, RateLimitConfig, StoreFailurePolicy};
use consilium_core::store::{ConsultationStore, JsonlConsultationStore};
use consilium_core::types::{ConsultationRequest, Gender, PatientContext};
use consilium_core::{ConsultError, ConsultationOrchestrator};
use consilium_providers::{
    CompletionProvider, ProviderError, ProviderKind, ProviderRegistry, TurnRole,
};
use consilium_test_utils::{FailingStore, FixedProvider, ScriptedProvider, UnconfiguredProvider};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn orchestrator_with(
    provider: Arc<dyn CompletionProvider>,
    store: Arc<dyn ConsultationStore>,
    config: ConsiliumConfig,
) -> ConsultationOrchestrator {
    let registry = ProviderRegistry::new(provider.kind());
    registry.insert(provider);
    ConsultationOrchestrator::new(Arc::new(config), registry, store, ProviderKind::Gemini)
}

fn request(message: &str, session_id: &str) -> ConsultationRequest {
    ConsultationRequest {
        message: message.to_string(),
        session_id: session_id.to_string(),
        patient_info: None,
        ai_provider: None,
    }
}

#[tokio::test]
async fn consultation_produces_a_complete_record() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(JsonlConsultationStore::new(temp.path()).expect("store"));
    let provider = Arc::new(FixedProvider::new(ProviderKind::Grok, "rest and hydrate"));
    let orchestrator = orchestrator_with(provider, store, ConsiliumConfig::default());

    let record = orchestrator
        .handle(request("I have a headache", "s1"))
        .await
        .expect("consultation");

    assert_eq!(record.session_id, "s1".to_string());
    assert_eq!(record.patient_message, "I have a headache".to_string());
    assert_eq!(record.advisor_response, "rest and hydrate".to_string());
    assert_eq!(record.ai_provider, ProviderKind::Grok);
    assert_eq!(record.patient_info, None);
}

#[tokio::test]
async fn round_trip_history_returns_submitted_exchange() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(JsonlConsultationStore::new(temp.path()).expect("store"));
    let provider = Arc::new(FixedProvider::new(ProviderKind::Grok, "see a doctor"));
    let orchestrator = orchestrator_with(provider, store, ConsiliumConfig::default());

    let record = orchestrator
        .handle(request("my knee hurts", "s1"))
        .await
        .expect("consultation");

    let history = orchestrator.fetch_history("s1").await.expect("history");
    assert_eq!(history.session_id, "s1".to_string());
    let last = history.consultations.last().expect("last record");
    assert_eq!(last.patient_message, record.patient_message);
    assert_eq!(last.advisor_response, record.advisor_response);
    assert_eq!(last.id, record.id);
}

#[tokio::test]
async fn sequential_submissions_preserve_order_and_timestamps() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(JsonlConsultationStore::new(temp.path()).expect("store"));
    let provider = Arc::new(FixedProvider::new(ProviderKind::Grok, "ok"));
    let orchestrator = orchestrator_with(provider, store, ConsiliumConfig::default());

    orchestrator
        .handle(request("first message", "s1"))
        .await
        .expect("first");
    orchestrator
        .handle(request("second message", "s1"))
        .await
        .expect("second");

    let history = orchestrator.fetch_history("s1").await.expect("history");
    assert_eq!(history.consultations.len(), 2);
    assert_eq!(
        history.consultations[0].patient_message,
        "first message".to_string()
    );
    assert_eq!(
        history.consultations[1].patient_message,
        "second message".to_string()
    );
    assert!(history.consultations[0].timestamp < history.consultations[1].timestamp);
}

#[tokio::test]
async fn second_request_sees_prior_exchange_as_context() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(JsonlConsultationStore::new(temp.path()).expect("store"));
    let provider = Arc::new(FixedProvider::new(ProviderKind::Grok, "drink water"));
    let orchestrator = orchestrator_with(provider.clone(), store, ConsiliumConfig::default());

    orchestrator
        .handle(request("I have a fever", "s1"))
        .await
        .expect("first");
    let mut second = request("it is getting worse", "s1");
    second.patient_info = Some(PatientContext {
        age: Some(41),
        gender: Some(Gender::Male),
        location: Some("Accra".to_string()),
    });
    let record = orchestrator.handle(second).await.expect("second");

    let calls = provider.calls.lock().clone();
    assert_eq!(calls.len(), 2);
    let call = &calls[1];
    assert_eq!(call.history.len(), 2);
    assert_eq!(call.history[0].role, TurnRole::User);
    assert_eq!(call.history[0].content, "User: I have a fever".to_string());
    assert_eq!(call.history[1].role, TurnRole::Assistant);
    assert_eq!(call.history[1].content, "Advisor: drink water".to_string());
    assert_eq!(
        call.message,
        "Context - Age: 41, Gender: male, Location: Accra\n\nUser asks: it is getting worse"
            .to_string()
    );
    // The stored message stays uncontextualized.
    assert_eq!(record.patient_message, "it is getting worse".to_string());
}

#[tokio::test]
async fn admission_ceiling_rejects_excess_requests() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(JsonlConsultationStore::new(temp.path()).expect("store"));
    let provider = Arc::new(FixedProvider::new(ProviderKind::Grok, "ok"));
    let config = ConsiliumConfig::builder()
        .rate_limit(RateLimitConfig {
            max_requests: 2,
            window_secs: 60,
            max_sessions: 100,
        })
        .build();
    let orchestrator = orchestrator_with(provider, store, config);

    orchestrator
        .handle(request("one", "s1"))
        .await
        .expect("first");
    orchestrator
        .handle(request("two", "s1"))
        .await
        .expect("second");
    let err = orchestrator
        .handle(request("three", "s1"))
        .await
        .expect_err("over ceiling");
    assert!(matches!(err, ConsultError::TooManyRequests));

    // Another session is unaffected.
    orchestrator
        .handle(request("hello", "s2"))
        .await
        .expect("other session");
}

#[tokio::test]
async fn provider_failures_propagate_unchanged() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(JsonlConsultationStore::new(temp.path()).expect("store"));
    let provider = Arc::new(ScriptedProvider::new(
        ProviderKind::Grok,
        vec![
            Err(ProviderError::Timeout),
            Err(ProviderError::RateLimited),
            Err(ProviderError::Upstream("boom".to_string())),
        ],
    ));
    let orchestrator = orchestrator_with(provider, store, ConsiliumConfig::default());

    let err = orchestrator
        .handle(request("hello", "s1"))
        .await
        .expect_err("timeout");
    assert!(matches!(err, ConsultError::Provider(ProviderError::Timeout)));

    let err = orchestrator
        .handle(request("hello", "s1"))
        .await
        .expect_err("throttled");
    assert!(matches!(
        err,
        ConsultError::Provider(ProviderError::RateLimited)
    ));

    let err = orchestrator
        .handle(request("hello", "s1"))
        .await
        .expect_err("upstream");
    assert!(matches!(
        err,
        ConsultError::Provider(ProviderError::Upstream(_))
    ));
}

#[tokio::test]
async fn unconfigured_provider_fails_without_side_effects() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(JsonlConsultationStore::new(temp.path()).expect("store"));
    let provider = Arc::new(UnconfiguredProvider::new(ProviderKind::Gemini));
    let orchestrator = orchestrator_with(provider, store, ConsiliumConfig::default());

    let err = orchestrator
        .handle(request("hello", "s1"))
        .await
        .expect_err("unconfigured");
    assert!(matches!(
        err,
        ConsultError::Provider(ProviderError::Unconfigured)
    ));

    let history = orchestrator.fetch_history("s1").await.expect("history");
    assert_eq!(history.consultations.len(), 0);
}

#[tokio::test]
async fn store_failure_discards_by_default() {
    let store = Arc::new(FailingStore::new());
    let provider = Arc::new(FixedProvider::new(ProviderKind::Grok, "generated reply"));
    let orchestrator = orchestrator_with(provider, store, ConsiliumConfig::default());

    let err = orchestrator
        .handle(request("hello", "s1"))
        .await
        .expect_err("store failure");
    assert!(matches!(err, ConsultError::Store(_)));
}

#[tokio::test]
async fn store_failure_can_return_unrecorded_reply() {
    let store = Arc::new(FailingStore::new());
    let provider = Arc::new(FixedProvider::new(ProviderKind::Grok, "generated reply"));
    let mut config = ConsiliumConfig::default();
    config.persistence.on_store_failure = StoreFailurePolicy::ReturnUnrecorded;
    let orchestrator = orchestrator_with(provider, store, config);

    let record = orchestrator
        .handle(request("hello", "s1"))
        .await
        .expect("unrecorded reply");
    assert_eq!(record.advisor_response, "generated reply".to_string());
}

#[tokio::test]
async fn validation_rejects_before_dispatch() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(JsonlConsultationStore::new(temp.path()).expect("store"));
    let provider = Arc::new(FixedProvider::new(ProviderKind::Grok, "ok"));
    let orchestrator = orchestrator_with(provider.clone(), store, ConsiliumConfig::default());

    let err = orchestrator
        .handle(request("   ", "s1"))
        .await
        .expect_err("blank message");
    assert!(matches!(err, ConsultError::Validation(_)));

    let err = orchestrator
        .handle(request("hello", "bad/session"))
        .await
        .expect_err("bad session id");
    assert!(matches!(err, ConsultError::Validation(_)));

    assert_eq!(provider.calls.lock().len(), 0);
}

#[tokio::test]
async fn fetch_history_never_fails_for_unknown_sessions() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(JsonlConsultationStore::new(temp.path()).expect("store"));
    let provider = Arc::new(FixedProvider::new(ProviderKind::Grok, "ok"));
    let orchestrator = orchestrator_with(provider, store, ConsiliumConfig::default());

    let history = orchestrator.fetch_history("never-seen").await.expect("unknown");
    assert_eq!(history.consultations.len(), 0);

    // An id that fails boundary validation degrades to empty, not an error.
    let history = orchestrator.fetch_history("not a/valid id").await.expect("invalid");
    assert_eq!(history.consultations.len(), 0);
}

#[tokio::test]
async fn legacy_records_on_disk_normalize_in_history() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(JsonlConsultationStore::new(temp.path()).expect("store"));
    std::fs::write(
        temp.path().join("s1.jsonl"),
        concat!(
            "{\"id\":\"7ee5dd3e-8f47-4c5b-bd6d-9c3d9f6f9a01\",\"session_id\":\"s1\",",
            "\"patient_message\":\"old question\",\"doctor_response\":\"old answer\",",
            "\"timestamp\":\"2023-01-01T00:00:00Z\"}\n",
            "{\"session_id\":\"s1\",\"malformed\":true}\n",
        ),
    )
    .expect("seed legacy file");
    let provider = Arc::new(FixedProvider::new(ProviderKind::Grok, "new answer"));
    let orchestrator = orchestrator_with(provider.clone(), store, ConsiliumConfig::default());

    let history = orchestrator.fetch_history("s1").await.expect("history");
    assert_eq!(history.consultations.len(), 1);
    assert_eq!(
        history.consultations[0].advisor_response,
        "old answer".to_string()
    );
    assert_eq!(history.consultations[0].ai_provider, ProviderKind::Gemini);

    // The legacy exchange also feeds the next consultation's context.
    orchestrator
        .handle(request("new question", "s1"))
        .await
        .expect("consult");
    let calls = provider.calls.lock().clone();
    assert_eq!(calls[0].history[0].content, "User: old question".to_string());
    assert_eq!(
        calls[0].history[1].content,
        "Advisor: old answer".to_string()
    );
}
