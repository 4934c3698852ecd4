//! OpenRouter provider implementation using the Chat Completions API.
//!
//! One call to [`CompletionProvider::complete_once`] is one HTTP round trip:
//! the system instruction plus the stored history go out, and the text of
//! `choices[0].message.content` comes back. Anything else in the body is a
//! decode failure; retrying is the caller's business.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::inference::{
    CompletionError, CompletionProvider, CompletionRequest, Conversation, Role,
};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_REFERER: &str = "https://github.com/heel-rs/heel";
pub const DEFAULT_TITLE: &str = "AI Dog Trainer";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Placeholder in the system prompt replaced with today's date.
pub const DATE_PLACEHOLDER: &str = "{date}";

// ============================================================================
// Chat Completions API Types
// ============================================================================

#[derive(Serialize, Debug)]
struct WireMessage<'a> {
    role: Role,
    content: &'a str,
}

/// Asks for plain text back rather than JSON mode.
#[derive(Serialize, Debug)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    content: String,
}

// ============================================================================
// Translation Layer
// ============================================================================

/// System instruction first, then the history in stored order.
fn conversation_to_messages<'a>(
    system: &'a str,
    conversation: &'a Conversation,
) -> Vec<WireMessage<'a>> {
    std::iter::once(WireMessage {
        role: Role::System,
        content: system,
    })
    .chain(conversation.messages().iter().map(|m| WireMessage {
        role: m.role,
        content: &m.content,
    }))
    .collect()
}

/// Fills the date placeholder in a system prompt template.
pub fn system_instruction(template: &str, today: &str) -> String {
    template.replace(DATE_PLACEHOLDER, today)
}

/// Today's date the way the prompt spells it, e.g. "March 04, 2025".
pub fn today() -> String {
    chrono::Local::now().format("%B %d, %Y").to_string()
}

/// Pulls `choices[0].message.content` out of a response body.
pub fn extract_content(body: &str) -> Result<String, CompletionError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| CompletionError::Decode(e.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| CompletionError::Decode("response contained no choices".to_string()))
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// OpenRouter API provider using the Chat Completions endpoint.
pub struct OpenRouterProvider {
    base_url: String,
    system_prompt: String,
    referer: String,
    title: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenRouterProvider {
    /// Creates a new OpenRouter provider.
    ///
    /// # Arguments
    /// * `base_url` - Optional custom base URL (defaults to OpenRouter's API)
    /// * `system_prompt` - Instruction template; `{date}` is filled per request
    pub fn new(base_url: Option<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            system_prompt: system_prompt.into(),
            referer: DEFAULT_REFERER.to_string(),
            title: DEFAULT_TITLE.to_string(),
            timeout: REQUEST_TIMEOUT,
            client: reqwest::Client::new(),
        }
    }

    /// Sets the `HTTP-Referer` and `X-Title` headers OpenRouter uses for attribution.
    pub fn with_identity(mut self, referer: impl Into<String>, title: impl Into<String>) -> Self {
        self.referer = referer.into();
        self.title = title.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Posts the body and returns the raw response text.
    async fn send_request(&self, api_key: &str, json_body: String) -> Result<String, CompletionError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .body(json_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Network(format!(
                        "request timed out after {}s",
                        self.timeout.as_secs()
                    ))
                } else {
                    CompletionError::Network(e.to_string())
                }
            })?;

        debug!("OpenRouter response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let err_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("OpenRouter API error: {} - {}", status, err_body);
            return Err(CompletionError::Network(format!("HTTP {status}: {err_body}")));
        }

        response
            .text()
            .await
            .map_err(|e| CompletionError::Network(format!("failed to read response body: {e}")))
    }
}

#[async_trait]
impl CompletionProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn complete_once(&self, request: CompletionRequest<'_>) -> Result<String, CompletionError> {
        let api_key = request
            .config
            .credential()
            .ok_or(CompletionError::MissingCredential)?;

        let system = system_instruction(&self.system_prompt, &today());
        let chat_request = ChatRequest {
            model: &request.config.model,
            messages: conversation_to_messages(&system, request.conversation),
            temperature: request.config.temperature,
            response_format: ResponseFormat { format_type: "text" },
        };

        info!(
            "OpenRouter chat request: model={}, message_count={}, temperature={}",
            request.config.model,
            chat_request.messages.len(),
            request.config.temperature,
        );

        let json_body = serde_json::to_string(&chat_request).map_err(|e| {
            CompletionError::Unexpected(format!("request serialization failed: {e}"))
        })?;
        debug!("Raw OpenRouter request body: {} bytes", json_body.len());

        let body = self.send_request(api_key, json_body).await?;
        debug!("Raw OpenRouter response body: {} bytes", body.len());

        extract_content(&body)
    }
}
