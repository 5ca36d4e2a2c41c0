//! Chat completion HTTP client

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use avatar_config::LlmConfig;
use avatar_core::{Error, Result};

use crate::prompt::ChatMessage;

/// Anything that can turn a message list into raw model output
///
/// The planner depends on this seam so tests can inject canned or
/// failing models without a network.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Chat completion client for an OpenAI-compatible endpoint
pub struct ChatClient {
    http: reqwest::Client,
    config: LlmConfig,
    api_key: Option<String>,
}

impl ChatClient {
    pub fn new(config: LlmConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.is_none() {
            tracing::warn!(
                "LLM API key env var '{}' is not set; planning calls will fail and \
                 degrade to the default plan",
                config.api_key_env
            );
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .unwrap_or_default();

        Self {
            http,
            config,
            api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: String,
}

#[async_trait]
impl CompletionModel for ChatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "messages": messages,
        });

        let mut request = self.http.post(&self.config.api_url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let deadline = Duration::from_millis(self.config.request_timeout_ms);
        let response = tokio::time::timeout(deadline, request.send())
            .await
            .map_err(|_| Error::Timeout(self.config.request_timeout_ms))?
            .map_err(|e| Error::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(Error::Llm(format!(
                "completion endpoint returned {status}: {snippet}"
            )));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("malformed completion response: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Llm("completion response had no choices".to_string()))
    }
}
