//! Provider-agnostic conversation turn model.

use serde::{Deserialize, Serialize};

/// One reconstructed exchange message handed to a provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsultationTurn {
    /// Role that produced the turn.
    pub role: TurnRole,
    /// Turn content.
    pub content: String,
}

impl ConsultationTurn {
    /// Build a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    /// Build an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Speaker role for a reconstructed turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// Patient-authored message.
    User,
    /// Advisor-authored reply.
    Assistant,
}

impl TurnRole {
    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}
