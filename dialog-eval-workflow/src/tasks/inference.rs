//! OpenAI-compatible chat completion client.

use async_trait::async_trait;
use dialog_eval_core::{
    ChatMessage, InferenceError, ModelClient, ModelReply, ModelSettings, TaskKind, TokenUsage,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::time::{sleep, Duration, Instant};

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Upper bound on the wait between retries.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Exponential backoff from one second, capped at [`MAX_RETRY_DELAY`].
pub fn retry_delay(attempt: u32) -> Duration {
    std::cmp::min(
        Duration::from_secs(2_u64.saturating_pow(attempt)),
        MAX_RETRY_DELAY,
    )
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    settings: ModelSettings,
}

impl OpenAiClient {
    pub fn new(api_key: impl AsRef<str>, settings: ModelSettings) -> Result<Self, InferenceError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", api_key.as_ref()))
            .map_err(|_| InferenceError::Config("invalid API key format".to_string()))?;
        headers.insert(AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder()
            .timeout(settings.timeout_duration())
            .default_headers(headers)
            .gzip(true)
            .build()
            .map_err(|e| InferenceError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.api_base.trim_end_matches('/').to_string(),
            settings,
        })
    }

    /// Create with the API key taken from `OPENAI_API_KEY`.
    pub fn from_env(settings: ModelSettings) -> Result<Self, InferenceError> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| InferenceError::Config(format!("{} is not set", API_KEY_ENV)))?;
        Self::new(api_key, settings)
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_body<'a>(&'a self, messages: &'a [ChatMessage], kind: TaskKind) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.settings.model,
            messages,
            max_tokens: self.settings.max_tokens_for(kind),
            temperature: self.settings.temperature,
            logit_bias: self.settings.logit_bias_for(kind),
        }
    }

    async fn call_once(&self, body: &ChatCompletionRequest<'_>) -> Result<ModelReply, InferenceError> {
        let start = Instant::now();

        let response = self
            .client
            .post(self.chat_url())
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        let elapsed = start.elapsed();

        if !status.is_success() {
            return Err(InferenceError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&text).map_err(|e| InferenceError::Malformed(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(InferenceError::EmptyResponse)?;

        let usage = parsed.usage.map(TokenUsage::from).unwrap_or_default();

        Ok(ModelReply {
            content: content.trim().to_string(),
            elapsed,
            usage,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> InferenceError {
        if err.is_timeout() {
            InferenceError::Timeout(self.settings.timeout)
        } else {
            InferenceError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn respond(
        &self,
        messages: &[ChatMessage],
        kind: TaskKind,
    ) -> Result<ModelReply, InferenceError> {
        let body = self.request_body(messages, kind);
        let mut attempt = 0;

        loop {
            match self.call_once(&body).await {
                Ok(reply) => return Ok(reply),
                Err(err) if err.is_retryable() && attempt < self.settings.max_retries => {
                    let delay = retry_delay(attempt);
                    attempt += 1;
                    tracing::warn!(
                        error = %err,
                        "Inference attempt {} failed, retrying in {:?}",
                        attempt,
                        delay
                    );
                    sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

// ===== API types =====

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    logit_bias: Option<&'a HashMap<String, i32>>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

impl From<Usage> for TokenUsage {
    fn from(usage: Usage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}
