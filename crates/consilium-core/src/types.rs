//! Core data types shared across the consultation API.

use chrono::{DateTime, Utc};
use consilium_providers::ProviderKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Region assumed when a patient context omits a location.
pub const DEFAULT_LOCATION: &str = "Ghana";

/// Optional demographic context attached to a consultation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientContext {
    /// Patient age in years.
    #[serde(default)]
    pub age: Option<u8>,
    /// Patient gender.
    #[serde(default)]
    pub gender: Option<Gender>,
    /// Free-text location, defaulting to the fixed region string.
    #[serde(default = "default_location")]
    pub location: Option<String>,
}

fn default_location() -> Option<String> {
    Some(DEFAULT_LOCATION.to_string())
}

impl PatientContext {
    /// Render the populated fields as a single context line, if any.
    pub fn summary(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(age) = self.age {
            parts.push(format!("Age: {age}"));
        }
        if let Some(gender) = self.gender {
            parts.push(format!("Gender: {}", gender.as_str()));
        }
        if let Some(location) = &self.location {
            parts.push(format!("Location: {location}"));
        }
        if parts.is_empty() {
            return None;
        }
        Some(format!("Context - {}", parts.join(", ")))
    }
}

/// Enumerated patient gender.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Return the gender as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

/// Inbound consultation submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultationRequest {
    /// Free-text patient message.
    pub message: String,
    /// Caller-chosen opaque session identifier.
    pub session_id: String,
    /// Optional demographic context.
    #[serde(default)]
    pub patient_info: Option<PatientContext>,
    /// Requested provider; the configured default is used when absent.
    #[serde(default)]
    pub ai_provider: Option<ProviderKind>,
}

/// One persisted consultation exchange. Insert-only, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsultationRecord {
    /// Record identifier, generated at creation.
    pub id: Uuid,
    /// Session the record belongs to.
    pub session_id: String,
    /// Raw patient message, unmodified by contextualization.
    pub patient_message: String,
    /// Raw provider reply text.
    pub advisor_response: String,
    /// Creation timestamp.
    pub timestamp: DateTime<Utc>,
    /// Demographic snapshot at submission time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_info: Option<PatientContext>,
    /// Provider that produced the reply.
    pub ai_provider: ProviderKind,
}

/// Ordered consultation history for a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionHistory {
    /// Session identifier.
    pub session_id: String,
    /// Records ordered by creation timestamp ascending.
    pub consultations: Vec<ConsultationRecord>,
}

/// Collaborator availability snapshot; degraded rather than failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    /// Whether the consultation store answered a reachability probe.
    pub store_reachable: bool,
    /// Credential status per registered provider.
    pub providers: Vec<ProviderStatus>,
}

/// Credential status for one registered provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderStatus {
    /// Provider identifier.
    pub kind: ProviderKind,
    /// Whether a credential is available.
    pub configured: bool,
}
