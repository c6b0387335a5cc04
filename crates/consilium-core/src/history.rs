//! Conversation history reconstruction across stored record shapes.
//!
//! Two shapes exist in stored data: the current one (`advisor_response` plus
//! `ai_provider`) and a legacy one (`doctor_response`, no provider field).
//! Both normalize to the current shape at read time; stored data is never
//! migrated. A record that cannot be normalized is skipped, never fatal.

use crate::error::ConsultError;
use crate::store::ConsultationStore;
use crate::types::{ConsultationRecord, PatientContext};
use chrono::{DateTime, Utc};
use consilium_providers::{ConsultationTurn, ProviderKind};
use log::{debug, warn};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Prefix applied to patient messages when expanded into turns.
const USER_PREFIX: &str = "User";
/// Prefix applied to advisor replies when expanded into turns.
const ADVISOR_PREFIX: &str = "Advisor";

/// Loads and normalizes a session's past exchanges.
#[derive(Clone)]
pub struct HistoryReconstructor {
    store: Arc<dyn ConsultationStore>,
    legacy_provider: ProviderKind,
}

impl HistoryReconstructor {
    /// Create a reconstructor over a store, with the provider assumed for
    /// records that predate the provider field.
    pub fn new(store: Arc<dyn ConsultationStore>, legacy_provider: ProviderKind) -> Self {
        Self {
            store,
            legacy_provider,
        }
    }

    /// Load up to `max_records` normalized records, oldest first.
    pub async fn load_records(
        &self,
        session_id: &str,
        max_records: usize,
    ) -> Result<Vec<ConsultationRecord>, ConsultError> {
        let documents = self.store.find(session_id, max_records).await?;
        let fetched = documents.len();
        let records: Vec<ConsultationRecord> = documents
            .into_iter()
            .filter_map(|document| normalize(document, session_id, self.legacy_provider))
            .collect();
        let skipped = fetched - records.len();
        if skipped > 0 {
            warn!(
                "skipped malformed consultation records (session_id={}, skipped={}, kept={})",
                session_id,
                skipped,
                records.len()
            );
        }
        debug!(
            "reconstructed history (session_id={}, records={})",
            session_id,
            records.len()
        );
        Ok(records)
    }

    /// Load history as provider-ready turns, two per surviving record.
    pub async fn load(
        &self,
        session_id: &str,
        max_records: usize,
    ) -> Result<Vec<ConsultationTurn>, ConsultError> {
        let records = self.load_records(session_id, max_records).await?;
        let turns = records
            .iter()
            .flat_map(|record| {
                [
                    ConsultationTurn::user(format!(
                        "{USER_PREFIX}: {}",
                        record.patient_message
                    )),
                    ConsultationTurn::assistant(format!(
                        "{ADVISOR_PREFIX}: {}",
                        record.advisor_response
                    )),
                ]
            })
            .collect();
        Ok(turns)
    }
}

/// Normalize a raw stored document into the current record shape.
///
/// Returns `None` for documents missing a patient message or any reply text
/// under either field name.
fn normalize(
    document: Value,
    session_id: &str,
    legacy_provider: ProviderKind,
) -> Option<ConsultationRecord> {
    let document = document.as_object()?;

    let patient_message = text_field(document, "patient_message")?;
    let advisor_response = text_field(document, "advisor_response")
        .or_else(|| text_field(document, "doctor_response"))?;

    let ai_provider = document
        .get("ai_provider")
        .and_then(Value::as_str)
        .and_then(ProviderKind::parse)
        .unwrap_or(legacy_provider);
    let id = document
        .get("id")
        .and_then(Value::as_str)
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .unwrap_or_else(Uuid::new_v4);
    let timestamp = document
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);
    let patient_info: Option<PatientContext> = document
        .get("patient_info")
        .cloned()
        .and_then(|value| serde_json::from_value(value).ok());
    let session_id = document
        .get("session_id")
        .and_then(Value::as_str)
        .unwrap_or(session_id)
        .to_string();

    Some(ConsultationRecord {
        id,
        session_id,
        patient_message,
        advisor_response,
        timestamp,
        patient_info,
        ai_provider,
    })
}

/// Read a non-empty string field from a stored document.
fn text_field(document: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    document
        .get(key)
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::normalize;
    use consilium_providers::ProviderKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn legacy_shape_normalizes_to_current() {
        let document = json!({
            "id": "7ee5dd3e-8f47-4c5b-bd6d-9c3d9f6f9a01",
            "session_id": "s1",
            "patient_message": "I have a cough",
            "doctor_response": "rest and fluids",
            "timestamp": "2023-04-01T10:00:00Z",
        });

        let record = normalize(document, "s1", ProviderKind::Gemini).expect("normalized");
        assert_eq!(record.advisor_response, "rest and fluids".to_string());
        assert_eq!(record.ai_provider, ProviderKind::Gemini);
        assert_eq!(
            record.id.to_string(),
            "7ee5dd3e-8f47-4c5b-bd6d-9c3d9f6f9a01".to_string()
        );
    }

    #[test]
    fn current_shape_keeps_its_provider() {
        let document = json!({
            "session_id": "s1",
            "patient_message": "hello",
            "advisor_response": "hi",
            "ai_provider": "grok",
            "timestamp": "2024-02-02T08:30:00Z",
        });

        let record = normalize(document, "s1", ProviderKind::Gemini).expect("normalized");
        assert_eq!(record.ai_provider, ProviderKind::Grok);
    }

    #[test]
    fn current_field_wins_over_legacy_field() {
        let document = json!({
            "session_id": "s1",
            "patient_message": "hello",
            "advisor_response": "current",
            "doctor_response": "legacy",
        });

        let record = normalize(document, "s1", ProviderKind::Gemini).expect("normalized");
        assert_eq!(record.advisor_response, "current".to_string());
    }

    #[test]
    fn blank_current_field_falls_back_to_legacy_field() {
        let document = json!({
            "session_id": "s1",
            "patient_message": "hello",
            "advisor_response": "",
            "doctor_response": "legacy reply",
        });

        let record = normalize(document, "s1", ProviderKind::Gemini).expect("normalized");
        assert_eq!(record.advisor_response, "legacy reply".to_string());
    }

    #[test]
    fn record_without_any_response_is_rejected() {
        let document = json!({ "session_id": "s1", "patient_message": "hello" });
        assert_eq!(normalize(document, "s1", ProviderKind::Gemini), None);

        let document = json!({ "session_id": "s1", "doctor_response": "orphan reply" });
        assert_eq!(normalize(document, "s1", ProviderKind::Gemini), None);
    }
}
