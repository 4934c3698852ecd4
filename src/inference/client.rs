//! Retry loop around a single-attempt [`CompletionProvider`].

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use super::provider::{CompletionError, CompletionProvider, CompletionRequest};
use super::types::{Conversation, RequestConfig};

/// Pause between a failed decode and the next attempt.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

/// What happened on one attempt, reported to the observer as it finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionAttempt {
    /// 1-based attempt number.
    pub number: u8,
    /// Reply text, when the attempt produced one.
    pub raw_text: Option<String>,
    pub error: Option<CompletionError>,
}

impl CompletionAttempt {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Progress reported by [`CompletionClient::complete_observed`].
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptEvent {
    /// An attempt is about to be sent.
    Started { number: u8, max_attempts: u8 },
    /// An attempt came back.
    Finished(CompletionAttempt),
}

/// Sends completions and retries the ones whose reply could not be decoded.
///
/// Network failures and unexpected errors end the turn on the first attempt.
/// A missing credential fails before the provider is asked at all.
#[derive(Clone)]
pub struct CompletionClient {
    provider: Arc<dyn CompletionProvider>,
    backoff: Duration,
}

impl CompletionClient {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            backoff: DEFAULT_BACKOFF,
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn complete(
        &self,
        conversation: &Conversation,
        config: &RequestConfig,
    ) -> Result<String, CompletionError> {
        self.complete_observed(conversation, config, |_| {}).await
    }

    /// Like [`complete`](Self::complete), reporting the start and end of every attempt.
    pub async fn complete_observed<F>(
        &self,
        conversation: &Conversation,
        config: &RequestConfig,
        mut on_event: F,
    ) -> Result<String, CompletionError>
    where
        F: FnMut(AttemptEvent) + Send,
    {
        if !config.has_credential() {
            warn!("Completion requested without an API key");
            return Err(CompletionError::MissingCredential);
        }

        let max_attempts = config.max_retries.max(1);
        let request = CompletionRequest {
            conversation,
            config,
        };

        let mut number = 0u8;
        loop {
            number += 1;
            info!(
                "Completion attempt {}/{} via {} (model={})",
                number,
                max_attempts,
                self.provider.name(),
                config.model
            );
            on_event(AttemptEvent::Started {
                number,
                max_attempts,
            });

            let result = self.provider.complete_once(request).await;
            on_event(AttemptEvent::Finished(CompletionAttempt {
                number,
                raw_text: result.as_ref().ok().cloned(),
                error: result.as_ref().err().cloned(),
            }));

            match result {
                Ok(text) => {
                    info!("Completion succeeded on attempt {} ({} bytes)", number, text.len());
                    return Ok(text);
                }
                Err(err) if err.is_retryable() && number < max_attempts => {
                    warn!("Attempt {} failed, retrying in {:?}: {}", number, self.backoff, err);
                    tokio::time::sleep(self.backoff).await;
                }
                Err(err) => {
                    warn!("Completion failed after {} attempt(s): {}", number, err);
                    return Err(err);
                }
            }
        }
    }
}
