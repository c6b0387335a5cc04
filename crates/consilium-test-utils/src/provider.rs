//! Completion provider doubles.

use async_trait::async_trait;
use consilium_providers::{CompletionProvider, ConsultationTurn, ProviderError, ProviderKind};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// One recorded `complete` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedCall {
    pub system_prompt: String,
    pub history: Vec<ConsultationTurn>,
    pub message: String,
}

/// Provider that always returns the same reply and records every call.
pub struct FixedProvider {
    kind: ProviderKind,
    reply: String,
    /// Calls captured in invocation order.
    pub calls: Mutex<Vec<CapturedCall>>,
}

impl FixedProvider {
    pub fn new(kind: ProviderKind, reply: impl Into<String>) -> Self {
        Self {
            kind,
            reply: reply.into(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CompletionProvider for FixedProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ConsultationTurn],
        message: &str,
    ) -> Result<String, ProviderError> {
        self.calls.lock().push(CapturedCall {
            system_prompt: system_prompt.to_string(),
            history: history.to_vec(),
            message: message.to_string(),
        });
        Ok(self.reply.clone())
    }
}

/// Provider that replays a fixed sequence of outcomes.
pub struct ScriptedProvider {
    kind: ProviderKind,
    outcomes: Mutex<VecDeque<Result<String, ProviderError>>>,
}

impl ScriptedProvider {
    pub fn new(kind: ProviderKind, outcomes: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            kind,
            outcomes: Mutex::new(outcomes.into()),
        }
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn complete(
        &self,
        _system_prompt: &str,
        _history: &[ConsultationTurn],
        _message: &str,
    ) -> Result<String, ProviderError> {
        self.outcomes
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Upstream("script exhausted".to_string())))
    }
}

/// Provider with no credential; every call fails immediately.
pub struct UnconfiguredProvider {
    kind: ProviderKind,
}

impl UnconfiguredProvider {
    pub fn new(kind: ProviderKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl CompletionProvider for UnconfiguredProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn is_configured(&self) -> bool {
        false
    }

    async fn complete(
        &self,
        _system_prompt: &str,
        _history: &[ConsultationTurn],
        _message: &str,
    ) -> Result<String, ProviderError> {
        Err(ProviderError::Unconfigured)
    }
}
