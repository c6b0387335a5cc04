//! Gemini completion provider.
//!
//! Speaks the native conversation-object format: a system instruction plus a
//! `contents` array of role/parts entries, with the new message appended as
//! the final user entry.

use crate::error::ProviderError;
use crate::provider::{CompletionProvider, ProviderKind, map_transport_error};
use crate::retry::{RetryPolicy, retry_throttled};
use crate::turn::{ConsultationTurn, TurnRole};
use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;
use serde_json::{Value, json};

/// Gemini-backed completion provider.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    retry: RetryPolicy,
}

impl GeminiProvider {
    /// Create a provider over a shared HTTP client.
    pub fn new(
        client: reqwest::Client,
        api_key: Option<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            api_key,
            model: model.into(),
            base_url: base_url.into(),
            retry,
        }
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ConsultationTurn],
        message: &str,
    ) -> Result<String, ProviderError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ProviderError::Unconfigured);
        };
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = build_request(system_prompt, history, message);
        debug!(
            "calling gemini (model={}, history_turns={})",
            self.model,
            history.len()
        );

        retry_throttled(&self.retry, "gemini", || {
            let request = self
                .client
                .post(&url)
                .header("x-goog-api-key", api_key)
                .json(&body);
            async move {
                let response = request.send().await.map_err(map_transport_error)?;
                check_status(response.status())?;
                let payload: Value = response.json().await.map_err(map_transport_error)?;
                parse_reply(&payload)
            }
        })
        .await
    }
}

/// Build the generateContent request body.
fn build_request(system_prompt: &str, history: &[ConsultationTurn], message: &str) -> Value {
    let mut contents: Vec<Value> = history
        .iter()
        .map(|turn| {
            let role = match turn.role {
                TurnRole::User => "user",
                TurnRole::Assistant => "model",
            };
            json!({ "role": role, "parts": [{ "text": turn.content }] })
        })
        .collect();
    contents.push(json!({ "role": "user", "parts": [{ "text": message }] }));
    json!({
        "system_instruction": { "parts": [{ "text": system_prompt }] },
        "contents": contents,
    })
}

/// Classify an upstream status before reading the body.
fn check_status(status: StatusCode) -> Result<(), ProviderError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::RateLimited);
    }
    if !status.is_success() {
        return Err(ProviderError::Upstream(format!(
            "gemini returned status {status}"
        )));
    }
    Ok(())
}

/// Extract reply text from a generateContent response.
fn parse_reply(payload: &Value) -> Result<String, ProviderError> {
    let parts = payload
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ProviderError::Upstream("gemini response missing candidates".to_string())
        })?;
    let reply: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    if reply.is_empty() {
        return Err(ProviderError::Upstream(
            "gemini response contained no reply text".to_string(),
        ));
    }
    Ok(reply)
}
