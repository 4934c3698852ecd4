pub mod client;
pub mod provider;
pub mod providers;
pub mod types;

pub use client::{AttemptEvent, CompletionAttempt, CompletionClient, DEFAULT_BACKOFF};
pub use provider::{CompletionError, CompletionProvider, CompletionRequest};
pub use providers::OpenRouterProvider;
pub use types::{
    Conversation, DEFAULT_GREETING, DEFAULT_RETRIES, DEFAULT_TEMPERATURE, MAX_RETRIES,
    MIN_RETRIES, Message, RequestConfig, Role,
};
