//! Question answering over a transcript through a hosted chat-completions API.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    error::{Result, ScrublineError},
    format::format_context,
    provider::Provider,
    types::Segment,
};

pub const SYSTEM_PROMPT: &str = "You are an AI assistant that helps answer questions about video content based on its transcript.
When answering, always include timestamp references from the transcript that support your answer.
Format timestamps exactly as they appear in the transcript.
Provide concise, accurate answers based only on the transcript content.";

const GENERIC_FAILURE: &str = "Failed to get AI response";

#[derive(Debug, Clone, PartialEq)]
pub struct AskConfig {
    pub provider: Provider,
    /// Overrides the provider's default model.
    pub model: Option<String>,
    /// Overrides the provider's endpoint.
    pub api_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for AskConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: None,
            api_url: None,
            temperature: 0.3,
            max_tokens: 500,
        }
    }
}

impl AskConfig {
    /// Defaults overridden by `SCRUBLINE_PROVIDER`, `SCRUBLINE_MODEL`,
    /// `SCRUBLINE_API_URL`, `SCRUBLINE_TEMPERATURE` and `SCRUBLINE_MAX_TOKENS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            provider: value("SCRUBLINE_PROVIDER")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.provider),
            model: value("SCRUBLINE_MODEL"),
            api_url: value("SCRUBLINE_API_URL"),
            temperature: value("SCRUBLINE_TEMPERATURE")
                .and_then(|t| t.parse().ok())
                .unwrap_or(defaults.temperature),
            max_tokens: value("SCRUBLINE_MAX_TOKENS")
                .and_then(|t| t.parse().ok())
                .unwrap_or(defaults.max_tokens),
        }
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.config().model)
    }

    pub fn endpoint(&self) -> &str {
        self.api_url
            .as_deref()
            .unwrap_or_else(|| self.provider.config().api_url)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

pub fn build_request(question: &str, segments: &[Segment], config: &AskConfig) -> ChatRequest {
    let context = format_context(segments);
    ChatRequest {
        model: config.model().to_string(),
        messages: vec![
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user",
                content: format!(
                    "Here is the transcript:\n\n{}\n\nQuestion: {}",
                    context, question
                ),
            },
        ],
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    }
}

/// Message to show for a non-success response body.
pub fn upstream_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| GENERIC_FAILURE.to_string())
}

/// Something that turns one chat request into answer text.
pub trait CompletionBackend {
    async fn complete(
        &self,
        endpoint: &str,
        credential: &str,
        request: &ChatRequest,
    ) -> Result<String>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpBackend {
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl CompletionBackend for HttpBackend {
    async fn complete(
        &self,
        endpoint: &str,
        credential: &str,
        request: &ChatRequest,
    ) -> Result<String> {
        let response = self
            .client
            .post(endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", credential))
            .json(request)
            .send()
            .await
            .map_err(upstream)?;

        let status = response.status();
        let body = response.text().await.map_err(upstream)?;

        if !status.is_success() {
            let message = upstream_message(&body);
            warn!(%status, %message, "completion request rejected");
            return Err(ScrublineError::Upstream { message });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| ScrublineError::Upstream {
                message: format!("Invalid API response: {}", e),
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ScrublineError::Upstream {
                message: "Invalid API response: no choices".to_string(),
            })
    }
}

fn upstream(err: reqwest::Error) -> ScrublineError {
    warn!(error = %err, "completion request failed");
    ScrublineError::Upstream {
        message: err.to_string(),
    }
}

/// Ask one question about the transcript. Exactly one request, no retry.
pub async fn ask<B: CompletionBackend>(
    backend: &B,
    config: &AskConfig,
    question: &str,
    segments: &[Segment],
    credential: Option<&str>,
) -> Result<String> {
    let question = question.trim();
    if question.is_empty() {
        return Err(ScrublineError::EmptyQuestion);
    }
    let credential = credential
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or(ScrublineError::MissingCredential)?;

    let request = build_request(question, segments, config);
    debug!(
        endpoint = config.endpoint(),
        model = %request.model,
        segments = segments.len(),
        "asking question"
    );

    backend.complete(config.endpoint(), credential, &request).await
}
