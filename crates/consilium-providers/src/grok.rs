//! Grok completion provider.
//!
//! Speaks the flattened role/content chat format: the persona instruction is
//! prepended as a system message and history turns are mapped one-to-one.

use crate::error::ProviderError;
use crate::provider::{CompletionProvider, ProviderKind, map_transport_error};
use crate::retry::{RetryPolicy, retry_throttled};
use crate::turn::ConsultationTurn;
use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;
use serde_json::{Value, json};

const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 1000;

/// Grok-backed completion provider.
pub struct GrokProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    retry: RetryPolicy,
}

impl GrokProvider {
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
impl CompletionProvider for GrokProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Grok
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
        let url = format!("{}/chat/completions", self.base_url);
        let body = build_request(&self.model, system_prompt, history, message);
        debug!(
            "calling grok (model={}, history_turns={})",
            self.model,
            history.len()
        );

        retry_throttled(&self.retry, "grok", || {
            let request = self.client.post(&url).bearer_auth(api_key).json(&body);
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

/// Build the chat/completions request body.
fn build_request(
    model: &str,
    system_prompt: &str,
    history: &[ConsultationTurn],
    message: &str,
) -> Value {
    let mut messages = vec![json!({ "role": "system", "content": system_prompt })];
    messages.extend(history.iter().map(|turn| {
        json!({ "role": turn.role.as_str(), "content": turn.content })
    }));
    messages.push(json!({ "role": "user", "content": message }));
    json!({
        "model": model,
        "messages": messages,
        "temperature": TEMPERATURE,
        "max_tokens": MAX_TOKENS,
    })
}

/// Classify an upstream status before reading the body.
fn check_status(status: StatusCode) -> Result<(), ProviderError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::RateLimited);
    }
    if !status.is_success() {
        return Err(ProviderError::Upstream(format!(
            "grok returned status {status}"
        )));
    }
    Ok(())
}

/// Extract reply text from a chat/completions response.
fn parse_reply(payload: &Value) -> Result<String, ProviderError> {
    payload
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .filter(|content| !content.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ProviderError::Upstream("grok response missing reply text".to_string()))
}
