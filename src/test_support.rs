//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::core::state::{App, Settings};
use crate::inference::{CompletionError, CompletionProvider, CompletionRequest};

/// Provider that replays a fixed list of results, one per call.
///
/// Once the script runs out every call fails with `Unexpected`.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, CompletionError>>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<String, CompletionError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of times `complete_once` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete_once(&self, _request: CompletionRequest<'_>) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CompletionError::Unexpected("script exhausted".into())))
    }
}

/// Settings with a test model and a dummy key.
pub fn test_settings() -> Settings {
    Settings {
        model: "test-model".to_string(),
        temperature: 0.5,
        max_retries: 2,
        api_key: Some("sk-or-test".to_string()),
        models: Vec::new(),
    }
}

/// Creates a test App with the default greeting and a dummy key.
pub fn test_app() -> App {
    App::new(test_settings(), crate::inference::DEFAULT_GREETING)
}
