//! Chat-completions backend over HTTP
//!
//! Sends the prompt as a single user message and returns the first choice's
//! text untouched. Anything that is not a 2xx response with a parseable body
//! is a transport failure.

use super::{AdvisoryBackend, AdvisoryPrompt, BackendFuture};
use dishfill_types::AdvisoryError;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct RawChatResponse {
    #[serde(default)]
    choices: Option<Vec<RawChoice>>,
    #[serde(default)]
    error: Option<RawApiError>,
}

#[derive(Debug, Deserialize)]
struct RawChoice {
    message: RawMessage,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawApiError {
    message: String,
}

/// OpenAI-compatible chat completions client
pub struct OpenAiBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiBackend {
    /// Build a client with a request timeout. The orchestrator applies its own
    /// deadline on top; this one bounds the socket.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, AdvisoryError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("dishfill/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| AdvisoryError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, prompt: &AdvisoryPrompt) -> Result<String, AdvisoryError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt.text,
            }],
            max_tokens: prompt.max_tokens,
            temperature: self.temperature,
        };
        debug!(
            model = %self.model,
            purpose = prompt.purpose.label(),
            max_tokens = prompt.max_tokens,
            "LLM request"
        );
        trace!(prompt = %prompt.text, "LLM prompt");

        let start = Instant::now();
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AdvisoryError::Transport(format!("request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| AdvisoryError::Transport(format!("failed to read response: {e}")))?;

        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            let truncated: String = text.chars().take(200).collect();
            return Err(AdvisoryError::Transport(format!("HTTP {status}: {truncated}")));
        }

        parse_chat_response(&text)
    }
}

impl AdvisoryBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    fn complete<'a>(&'a self, prompt: &'a AdvisoryPrompt) -> BackendFuture<'a> {
        Box::pin(self.send(prompt))
    }
}

/// Pull the first choice's content out of a chat-completions body.
///
/// A body without choices or content yields an empty string; the validator
/// rejects that as an unusable answer rather than a transport failure.
fn parse_chat_response(body: &str) -> Result<String, AdvisoryError> {
    let parsed: RawChatResponse = serde_json::from_str(body)
        .map_err(|e| AdvisoryError::Transport(format!("failed to parse response: {e}")))?;

    if let Some(err) = parsed.error {
        return Err(AdvisoryError::Transport(format!("API error: {}", err.message)));
    }

    Ok(parsed
        .choices
        .and_then(|choices| choices.into_iter().next())
        .and_then(|choice| choice.message.content)
        .unwrap_or_default())
}
