use std::fmt;

use serde::{Deserialize, Serialize};

/// Greeting every conversation starts with, and returns to after a clear.
pub const DEFAULT_GREETING: &str = "Hello! 🐶 I'm your Dog Training Expert. \
    Ask me about obedience training, behavior issues, or puppy care!";

pub const MIN_RETRIES: u8 = 1;
pub const MAX_RETRIES: u8 = 5;
pub const DEFAULT_RETRIES: u8 = 2;
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Only ever synthesized on the wire. Never stored in a `Conversation`.
    System,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Messages carrying badge markup are displayed with markup rendering enabled.
    pub fn has_badges(&self) -> bool {
        self.content.contains("badge")
    }
}

/// Ordered, append-only message history for one session.
///
/// Always holds at least the seed greeting. The only way to shrink it is
/// [`Conversation::clear`], which goes back to exactly that greeting.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    greeting: String,
    messages: Vec<Message>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// Creates a conversation seeded with the default greeting.
    pub fn new() -> Self {
        Self::with_greeting(DEFAULT_GREETING)
    }

    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        let greeting = greeting.into();
        Self {
            messages: vec![Message::assistant(greeting.clone())],
            greeting,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false: the greeting is never removed.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn push_user(&mut self, content: impl Into<String>) -> &Message {
        self.push(Message::user(content))
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) -> &Message {
        self.push(Message::assistant(content))
    }

    fn push(&mut self, message: Message) -> &Message {
        let index = self.messages.len();
        self.messages.push(message);
        &self.messages[index]
    }

    /// Drops all history and re-seeds the greeting.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.messages.push(Message::assistant(self.greeting.clone()));
    }

    /// Number of messages the user actually typed.
    pub fn user_turns(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == Role::User)
            .count()
    }
}

/// Per-turn request settings, taken from the session's live settings.
#[derive(Clone, PartialEq)]
pub struct RequestConfig {
    pub model: String,
    pub temperature: f32,
    pub max_retries: u8,
    pub api_key: Option<String>,
}

impl RequestConfig {
    /// Builds a config, clamping temperature to [0, 1] and retries to [1, 5].
    pub fn new(
        model: impl Into<String>,
        temperature: f32,
        max_retries: u8,
        api_key: Option<String>,
    ) -> Self {
        Self {
            model: model.into(),
            temperature: clamp_temperature(temperature),
            max_retries: max_retries.clamp(MIN_RETRIES, MAX_RETRIES),
            api_key,
        }
    }

    /// The key, if one is set and not blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn has_credential(&self) -> bool {
        self.credential().is_some()
    }
}

// Keeps the key out of logs.
impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestConfig")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_retries", &self.max_retries)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Clamps to [0, 1] and snaps to one decimal place. NaN becomes the default.
pub fn clamp_temperature(temperature: f32) -> f32 {
    if temperature.is_nan() {
        return DEFAULT_TEMPERATURE;
    }
    (temperature.clamp(0.0, 1.0) * 10.0).round() / 10.0
}

/// Next temperature in 0.1 steps, wrapping from 1.0 back to 0.0.
pub fn next_temperature(temperature: f32) -> f32 {
    let tenths = (clamp_temperature(temperature) * 10.0).round() as u8;
    f32::from((tenths + 1) % 11) / 10.0
}

/// Next retry budget, cycling through 1..=5.
pub fn next_retries(max_retries: u8) -> u8 {
    if max_retries >= MAX_RETRIES {
        MIN_RETRIES
    } else {
        max_retries.saturating_add(1).max(MIN_RETRIES)
    }
}
