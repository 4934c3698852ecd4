use std::fmt;

use async_trait::async_trait;

use super::types::{Conversation, RequestConfig};

/// Errors that can end a completion.
///
/// The variants encode the retry policy: only `Decode` is worth another
/// attempt, everything else is surfaced as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionError {
    /// No API key configured. Raised before any network call.
    MissingCredential,
    /// The response body was not the expected JSON shape.
    Decode(String),
    /// Transport failure, timeout, or non-2xx status.
    Network(String),
    /// Anything else.
    Unexpected(String),
}

impl CompletionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CompletionError::Decode(_))
    }

    /// One-line remediation shown under the error.
    pub fn hint(&self) -> &'static str {
        match self {
            CompletionError::MissingCredential => {
                "Set OPENROUTER_API_KEY or add api_key under [openrouter] in ~/.heel/config.toml"
            }
            CompletionError::Decode(_) => {
                "Try rephrasing your question or breaking it into smaller parts"
            }
            CompletionError::Network(_) => "Check your internet connection and try again later",
            CompletionError::Unexpected(_) => "Check your input and try again",
        }
    }

    /// Assistant line recorded in the transcript when a turn fails.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            CompletionError::MissingCredential => "Error: API key required - see the setup guide",
            CompletionError::Decode(_) => {
                "Error: Failed to process response - try rephrasing your question"
            }
            CompletionError::Network(_) => "Error: Connection issue - try again later",
            CompletionError::Unexpected(_) => "Error: Please check your input and try again",
        }
    }
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionError::MissingCredential => write!(f, "API key required"),
            CompletionError::Decode(msg) => write!(f, "failed to process response: {msg}"),
            CompletionError::Network(msg) => write!(f, "network error: {msg}"),
            CompletionError::Unexpected(msg) => write!(f, "unexpected error: {msg}"),
        }
    }
}

impl std::error::Error for CompletionError {}

/// Everything a provider needs for one attempt.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub conversation: &'a Conversation,
    pub config: &'a RequestConfig,
}

/// A single-attempt transport to a chat-completion service.
///
/// Implementations prepend their own system instruction; the retry policy
/// lives one layer up in [`CompletionClient`](super::CompletionClient).
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the name of the provider.
    fn name(&self) -> &str;

    /// Sends the request once and returns the reply text.
    async fn complete_once(&self, request: CompletionRequest<'_>) -> Result<String, CompletionError>;
}
