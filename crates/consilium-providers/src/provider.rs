//! Provider interface and identifiers.

use crate::error::ProviderError;
use crate::turn::ConsultationTurn;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identifier for a completion provider backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini.
    Gemini,
    /// xAI Grok.
    Grok,
}

impl ProviderKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Grok => "grok",
        }
    }

    /// Parse a kind from a lowercase string.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "gemini" => Some(ProviderKind::Gemini),
            "grok" => Some(ProviderKind::Grok),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
/// Completion provider abstraction used by the orchestrator.
pub trait CompletionProvider: Send + Sync {
    /// Identifier for this provider.
    fn kind(&self) -> ProviderKind;

    /// Whether a credential is available for this provider.
    fn is_configured(&self) -> bool;

    /// Produce reply text for the new message given reconstructed history.
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ConsultationTurn],
        message: &str,
    ) -> Result<String, ProviderError>;
}

/// Translate a reqwest transport failure into the provider taxonomy.
pub(crate) fn map_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        return ProviderError::Timeout;
    }
    ProviderError::Upstream(err.to_string())
}
