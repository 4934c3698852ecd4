//! # Actions
//!
//! Everything that can happen in Heel becomes an `Action`.
//! User presses Enter? That's `Action::Submit(text)`.
//! The API answers? That's `Action::CompletionSucceeded(raw)`.
//!
//! The `update()` function takes the current state and an action,
//! mutates the state, and returns an `Effect` describing any I/O the
//! caller should start. No side effects here. I/O happens elsewhere.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```
//!
//! A turn, as seen from here:
//!
//! ```text
//! Submit ─▶ SpawnRequest ─▶ AttemptStarted/AttemptFailed* ─┬─▶ CompletionSucceeded ─▶ SpawnRender
//!                                                         │      WordEmitted* ─▶ RenderFinished
//!                                                         └─▶ CompletionFailed
//! ```

use log::{debug, error, info, warn};

use crate::core::render::{self, Token};
use crate::core::state::{App, TurnState};
use crate::inference::CompletionError;
use crate::inference::types::{next_retries, next_temperature};

/// Assistant message appended when a turn is attempted without an API key.
pub const GETTING_STARTED_MESSAGE: &str = "🔐 API key required!

🚀 Getting Started Guide
1. Visit OpenRouter Keys: https://openrouter.ai/keys
2. Create free account & get API key
3. Set OPENROUTER_API_KEY, or add api_key under [openrouter] in ~/.heel/config.toml
4. Start training! 🎉";

/// Example questions, one badge per line.
pub const EXAMPLES_MESSAGE: &str = "Try these examples:
<span class='badge'>🐾 How to stop leash pulling?</span>
<span class='badge'>🏡 Create a potty training schedule</span>
<span class='badge'>😟 Help with separation anxiety</span>
<span class='badge'>🐕 Teach basic commands</span>";

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The user sent a question.
    Submit(String),
    ClearHistory,
    SeedExamples,
    /// The client is about to send attempt `number` of `max_attempts`.
    AttemptStarted { number: u8, max_attempts: u8 },
    /// Attempt `number` came back with an error.
    AttemptFailed { number: u8, error: CompletionError },
    /// The client returned reply text.
    CompletionSucceeded(String),
    /// The client gave up.
    CompletionFailed(CompletionError),
    /// The typewriter produced one more token.
    WordEmitted(Token),
    RenderFinished,
    CycleTemperature,
    CycleRetries,
    SelectModel(String),
    Quit,
}

/// I/O the event loop should start after an update.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    /// Send the conversation to the model.
    SpawnRequest,
    /// Type out this raw reply.
    SpawnRender(String),
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Submit(text) => handle_turn(app, text),
        Action::ClearHistory => {
            clear(app);
            Effect::None
        }
        Action::SeedExamples => {
            seed_examples(app);
            Effect::None
        }
        Action::AttemptStarted {
            number,
            max_attempts,
        } => {
            if matches!(app.turn, TurnState::AwaitingResponse | TurnState::RetryWait) {
                app.turn = TurnState::AwaitingResponse;
                app.attempt = Some((number, max_attempts));
                app.status_message = if number > 1 {
                    format!("{} (attempt {number}/{max_attempts})", app.turn.label())
                } else {
                    app.turn.label().to_string()
                };
            }
            Effect::None
        }
        Action::AttemptFailed { number, error } => {
            let max_attempts = app.attempt.map_or(number, |(_, max)| max);
            if app.turn == TurnState::AwaitingResponse
                && error.is_retryable()
                && number < max_attempts
            {
                warn!("Attempt {number}/{max_attempts} unreadable: {error}");
                app.turn = TurnState::RetryWait;
                app.status_message = format!("Couldn't read the reply, retrying ({number}/{max_attempts})");
            }
            Effect::None
        }
        Action::CompletionSucceeded(raw) => {
            if !app.is_loading() {
                debug!("Dropping completion that arrived outside a turn");
                return Effect::None;
            }
            info!("Reply received ({} bytes), typing it out", raw.len());
            app.turn = TurnState::Streaming;
            app.attempt = None;
            app.streaming = Some(String::new());
            app.status_message = app.turn.label().to_string();
            Effect::SpawnRender(raw)
        }
        Action::CompletionFailed(err) => {
            if !app.is_loading() {
                debug!("Dropping failure that arrived outside a turn: {err}");
                return Effect::None;
            }
            error!("Turn failed: {err}");
            app.error = Some(format!("{err}\n{}", err.hint()));
            app.conversation.push_assistant(err.fallback_message());
            app.turn = TurnState::Failed;
            app.attempt = None;
            app.streaming = None;
            app.status_message = app.turn.label().to_string();
            Effect::None
        }
        Action::WordEmitted(token) => {
            if let Some(buffer) = app.streaming.as_mut() {
                token.push_to(buffer);
            }
            Effect::None
        }
        Action::RenderFinished => {
            if let Some(text) = app.streaming.take() {
                let index = app.conversation.len();
                app.decorated.insert(index, render::decorate(&text));
                app.conversation.push_assistant(text);
                app.turn = TurnState::Done;
                app.status_message = app.turn.label().to_string();
            }
            Effect::None
        }
        Action::CycleTemperature => {
            app.settings.temperature = next_temperature(app.settings.temperature);
            app.status_message = format!("Creativity: {:.1}", app.settings.temperature);
            Effect::None
        }
        Action::CycleRetries => {
            app.settings.max_retries = next_retries(app.settings.max_retries);
            app.status_message = format!("Max retries: {}", app.settings.max_retries);
            Effect::None
        }
        Action::SelectModel(model) => {
            info!("Model switched to {model}");
            app.status_message = format!("Model: {model}");
            app.settings.model = model;
            Effect::None
        }
        Action::Quit => Effect::Quit,
    }
}

/// Starts a turn: records the question and asks for a request, or explains
/// how to configure a key if there is none.
fn handle_turn(app: &mut App, text: String) -> Effect {
    if app.is_loading() {
        debug!("Ignoring submit while a turn is in flight");
        return Effect::None;
    }
    let text = text.trim();
    if text.is_empty() {
        return Effect::None;
    }

    app.conversation.push_user(text);
    app.error = None;

    if !app.request_config().has_credential() {
        let err = CompletionError::MissingCredential;
        warn!("Turn refused: {err}");
        app.conversation.push_assistant(GETTING_STARTED_MESSAGE);
        app.error = Some(format!("{err}\n{}", err.hint()));
        app.turn = TurnState::Failed;
        app.status_message = err.to_string();
        return Effect::None;
    }

    info!(
        "Turn started (history={} messages, model={})",
        app.conversation.len(),
        app.settings.model
    );
    app.turn = TurnState::AwaitingResponse;
    app.attempt = None;
    app.status_message = app.turn.label().to_string();
    Effect::SpawnRequest
}

fn clear(app: &mut App) {
    if app.is_loading() {
        app.status_message = "Can't clear while a reply is in progress".to_string();
        return;
    }
    app.conversation.clear();
    app.decorated.clear();
    app.error = None;
    app.turn = TurnState::Idle;
    app.status_message = "Chat cleared".to_string();
    info!("Conversation cleared");
}

fn seed_examples(app: &mut App) {
    if app.is_loading() {
        app.status_message = "Examples are available once this reply finishes".to_string();
        return;
    }
    app.conversation.push_assistant(EXAMPLES_MESSAGE);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::render::{clean, render, tokens};
    use crate::inference::{DEFAULT_GREETING, Message, Role};
    use crate::test_support::test_app;

    /// Plays a raw reply through the typewriter actions.
    fn stream_reply(app: &mut App, raw: &str) {
        let effect = update(app, Action::CompletionSucceeded(raw.to_string()));
        assert_eq!(effect, Effect::SpawnRender(raw.to_string()));
        for token in tokens(&clean(raw)) {
            update(app, Action::WordEmitted(token));
        }
        update(app, Action::RenderFinished);
    }

    #[test]
    fn test_submit_appends_user_message_and_spawns_request() {
        let mut app = test_app();
        let effect = update(&mut app, Action::Submit("How do I teach sit?".into()));

        assert_eq!(effect, Effect::SpawnRequest);
        assert_eq!(app.turn, TurnState::AwaitingResponse);
        assert!(app.is_loading());
        assert_eq!(app.conversation.last(), Some(&Message::user("How do I teach sit?")));
    }

    #[test]
    fn test_submit_while_loading_is_ignored() {
        let mut app = test_app();
        update(&mut app, Action::Submit("first".into()));
        let effect = update(&mut app, Action::Submit("second".into()));

        assert_eq!(effect, Effect::None);
        assert_eq!(app.conversation.user_turns(), 1);
    }

    #[test]
    fn test_blank_submit_is_ignored() {
        let mut app = test_app();
        assert_eq!(update(&mut app, Action::Submit("   ".into())), Effect::None);
        assert_eq!(app.conversation.len(), 1);
    }

    #[test]
    fn test_successful_turn_appends_plain_text_and_decorates_for_display() {
        let mut app = test_app();
        update(&mut app, Action::Submit("Leash pulling?".into()));
        update(
            &mut app,
            Action::AttemptStarted {
                number: 1,
                max_attempts: 2,
            },
        );

        let raw = "**Goal:** loose leash\\nStep 1: stop when it pulls";
        stream_reply(&mut app, raw);

        assert_eq!(app.turn, TurnState::Done);
        assert!(!app.is_loading());
        assert!(app.streaming.is_none());

        let last = app.conversation.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, render(raw));
        assert!(!last.content.contains("<strong>"));

        let index = app.conversation.len() - 1;
        let decorated = &app.decorated[&index];
        assert!(decorated.contains("<strong>🌟 Goal:</strong>"));
        assert!(decorated.contains("<strong>Step</strong> 1:"));
    }

    #[test]
    fn test_streaming_buffer_grows_word_by_word() {
        let mut app = test_app();
        update(&mut app, Action::Submit("q".into()));
        update(&mut app, Action::CompletionSucceeded("Good dog".into()));

        assert_eq!(app.turn, TurnState::Streaming);
        assert_eq!(app.streaming.as_deref(), Some(""));
        update(&mut app, Action::WordEmitted(Token::Word("Good".into())));
        assert_eq!(app.streaming.as_deref(), Some("Good "));
        update(&mut app, Action::WordEmitted(Token::Word("dog".into())));
        update(&mut app, Action::WordEmitted(Token::LineBreak));
        assert_eq!(app.streaming.as_deref(), Some("Good dog \n"));

        // Not in the transcript until the typewriter is done
        assert_eq!(app.conversation.len(), 2);
        update(&mut app, Action::RenderFinished);
        assert_eq!(app.conversation.len(), 3);
    }

    #[test]
    fn test_retry_state_transitions() {
        let mut app = test_app();
        update(&mut app, Action::Submit("q".into()));
        update(
            &mut app,
            Action::AttemptStarted {
                number: 1,
                max_attempts: 3,
            },
        );
        update(
            &mut app,
            Action::AttemptFailed {
                number: 1,
                error: CompletionError::Decode("bad".into()),
            },
        );
        assert_eq!(app.turn, TurnState::RetryWait);
        assert!(app.is_loading());

        update(
            &mut app,
            Action::AttemptStarted {
                number: 2,
                max_attempts: 3,
            },
        );
        assert_eq!(app.turn, TurnState::AwaitingResponse);
        assert_eq!(app.attempt, Some((2, 3)));
        assert!(app.status_message.contains("2/3"));
    }

    #[test]
    fn test_final_or_non_retryable_attempt_does_not_enter_retry_wait() {
        let mut app = test_app();
        update(&mut app, Action::Submit("q".into()));
        update(
            &mut app,
            Action::AttemptStarted {
                number: 2,
                max_attempts: 2,
            },
        );
        update(
            &mut app,
            Action::AttemptFailed {
                number: 2,
                error: CompletionError::Decode("bad".into()),
            },
        );
        assert_eq!(app.turn, TurnState::AwaitingResponse);

        update(
            &mut app,
            Action::AttemptFailed {
                number: 1,
                error: CompletionError::Network("HTTP 500".into()),
            },
        );
        assert_eq!(app.turn, TurnState::AwaitingResponse);
    }

    #[test]
    fn test_failure_appends_fallback_and_shows_hint() {
        let mut app = test_app();
        update(&mut app, Action::Submit("q".into()));
        let err = CompletionError::Network("HTTP 502".into());
        update(&mut app, Action::CompletionFailed(err.clone()));

        assert_eq!(app.turn, TurnState::Failed);
        assert!(!app.is_loading());
        assert_eq!(
            app.conversation.last(),
            Some(&Message::assistant("Error: Connection issue - try again later"))
        );
        let shown = app.error.as_deref().unwrap();
        assert!(shown.contains("HTTP 502"));
        assert!(shown.contains(err.hint()));

        // The next turn starts clean
        assert_eq!(update(&mut app, Action::Submit("again".into())), Effect::SpawnRequest);
        assert!(app.error.is_none());
    }

    #[test]
    fn test_every_turn_adds_exactly_one_assistant_message() {
        let assistant_count =
            |app: &App| app.conversation.messages().iter().filter(|m| m.role == Role::Assistant).count();

        let mut app = test_app();
        let before = assistant_count(&app);
        update(&mut app, Action::Submit("a".into()));
        stream_reply(&mut app, "Sit.");
        assert_eq!(assistant_count(&app), before + 1);

        update(&mut app, Action::Submit("b".into()));
        update(&mut app, Action::CompletionFailed(CompletionError::Decode("x".into())));
        assert_eq!(assistant_count(&app), before + 2);
    }

    #[test]
    fn test_missing_credential_appends_only_remediation() {
        let mut app = test_app();
        app.settings.api_key = None;

        let effect = update(&mut app, Action::Submit("Help!".into()));

        assert_eq!(effect, Effect::None);
        assert_eq!(app.turn, TurnState::Failed);
        let messages = app.conversation.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1], Message::user("Help!"));
        assert_eq!(messages[2], Message::assistant(GETTING_STARTED_MESSAGE));
        assert!(app.error.as_deref().unwrap().contains("OPENROUTER_API_KEY"));
    }

    #[test]
    fn test_blank_credential_counts_as_missing() {
        let mut app = test_app();
        app.settings.api_key = Some("  ".into());
        assert_eq!(update(&mut app, Action::Submit("q".into())), Effect::None);
    }

    #[test]
    fn test_clear_resets_to_greeting() {
        let mut app = test_app();
        update(&mut app, Action::Submit("q".into()));
        stream_reply(&mut app, "Step 1: wait");
        update(&mut app, Action::SeedExamples);

        update(&mut app, Action::ClearHistory);

        assert_eq!(app.conversation.messages(), &[Message::assistant(DEFAULT_GREETING)]);
        assert!(app.decorated.is_empty());
        assert!(app.error.is_none());
        assert_eq!(app.turn, TurnState::Idle);
    }

    #[test]
    fn test_clear_is_refused_mid_turn() {
        let mut app = test_app();
        update(&mut app, Action::Submit("q".into()));
        update(&mut app, Action::ClearHistory);
        assert_eq!(app.conversation.len(), 2);
        assert!(app.is_loading());
    }

    #[test]
    fn test_seed_examples_twice_appends_identical_messages() {
        let mut app = test_app();
        let before = app.conversation.messages().to_vec();

        update(&mut app, Action::SeedExamples);
        update(&mut app, Action::SeedExamples);

        let messages = app.conversation.messages();
        assert_eq!(&messages[..before.len()], before.as_slice());
        assert_eq!(messages.len(), before.len() + 2);
        assert_eq!(messages[1], messages[2]);
        assert!(messages[1].has_badges());
    }

    #[test]
    fn test_stale_completion_is_dropped() {
        let mut app = test_app();
        assert_eq!(update(&mut app, Action::CompletionSucceeded("late".into())), Effect::None);
        update(&mut app, Action::CompletionFailed(CompletionError::Unexpected("late".into())));
        assert_eq!(app.conversation.len(), 1);
        assert_eq!(app.turn, TurnState::Idle);
    }

    #[test]
    fn test_settings_controls() {
        let mut app = test_app();
        update(&mut app, Action::CycleTemperature);
        assert_eq!(app.settings.temperature, 0.6);
        assert_eq!(app.status_message, "Creativity: 0.6");

        update(&mut app, Action::CycleRetries);
        assert_eq!(app.settings.max_retries, 3);

        update(&mut app, Action::SelectModel("anthropic/claude-3.5-haiku".into()));
        assert_eq!(app.request_config().model, "anthropic/claude-3.5-haiku");
    }

    #[test]
    fn test_quit() {
        let mut app = test_app();
        assert_eq!(update(&mut app, Action::Quit), Effect::Quit);
    }
}
