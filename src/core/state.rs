//! # Application State
//!
//! Core business state for Heel. This module contains domain logic only -
//! no TUI-specific types. Presentation state lives in the `tui` module.
//!
//! ```text
//! App
//! ├── conversation: Conversation    // seeded, append-only history
//! ├── settings: Settings            // model, temperature, retries, key
//! ├── turn: TurnState               // where the current turn is
//! ├── attempt: Option<(u8, u8)>     // (current, max) while requesting
//! ├── streaming: Option<String>     // typewriter buffer
//! ├── decorated: HashMap            // display form of finished replies
//! ├── status_message: String        // status bar text
//! └── error: Option<String>         // last error plus its hint
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.
//! This keeps things predictable, so no surprise mutations.

use std::collections::HashMap;

use crate::core::config::{ModelEntry, ResolvedConfig};
use crate::inference::{Conversation, RequestConfig};

/// Live, user-adjustable request settings.
#[derive(Clone, PartialEq)]
pub struct Settings {
    pub model: String,
    pub temperature: f32,
    pub max_retries: u8,
    pub api_key: Option<String>,
    /// Choices offered by the model picker.
    pub models: Vec<ModelEntry>,
}

impl Settings {
    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
            api_key: config.api_key.clone(),
            models: config.models.clone(),
        }
    }

    /// Snapshot for one turn.
    pub fn request_config(&self) -> RequestConfig {
        RequestConfig::new(
            self.model.clone(),
            self.temperature,
            self.max_retries,
            self.api_key.clone(),
        )
    }
}

/// Where the current turn is.
///
/// ```text
/// Idle → AwaitingResponse ─┬─▶ Streaming → Done
///            ▲             ├─▶ RetryWait ─┐
///            └─────────────┼──────────────┘
///                          └─▶ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    #[default]
    Idle,
    AwaitingResponse,
    RetryWait,
    Streaming,
    Done,
    Failed,
}

impl TurnState {
    /// True while a request or the typewriter is running.
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            TurnState::AwaitingResponse | TurnState::RetryWait | TurnState::Streaming
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            TurnState::Idle => "Ready",
            TurnState::AwaitingResponse => "Analyzing your query...",
            TurnState::RetryWait => "Retrying...",
            TurnState::Streaming => "Typing...",
            TurnState::Done => "Done",
            TurnState::Failed => "Failed",
        }
    }
}

pub struct App {
    pub conversation: Conversation,
    pub settings: Settings,
    pub turn: TurnState,
    /// `(current, max)` attempt numbers while a request is out.
    pub attempt: Option<(u8, u8)>,
    /// Text typed out so far. `Some` only while streaming.
    pub streaming: Option<String>,
    /// Decorated display text, keyed by conversation index.
    pub decorated: HashMap<usize, String>,
    pub status_message: String,
    pub error: Option<String>,
}

impl App {
    pub fn new(settings: Settings, greeting: impl Into<String>) -> Self {
        Self {
            conversation: Conversation::with_greeting(greeting),
            settings,
            turn: TurnState::Idle,
            attempt: None,
            streaming: None,
            decorated: HashMap::new(),
            status_message: String::from("Welcome to Heel!"),
            error: None,
        }
    }

    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self::new(Settings::from_config(config), config.greeting.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.turn.is_in_flight()
    }

    pub fn request_config(&self) -> RequestConfig {
        self.settings.request_config()
    }

    /// True once the user has typed anything this session.
    pub fn has_user_messages(&self) -> bool {
        self.conversation.user_turns() > 0
    }
}
