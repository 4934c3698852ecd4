//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Background work
//!
//! Two kinds of task run off the event loop and report back through an
//! `mpsc` channel of `Action`s:
//!
//! - **request**: one `CompletionClient::complete_observed` call, reporting
//!   each attempt as it starts and fails
//! - **render**: the typewriter, one `WordEmitted` per token
//!
//! ## Redraw Strategy
//!
//! - **Busy** (turn in flight): draws every ~30ms so words appear as they land.
//! - **Idle**: sleeps up to 500ms, only redraws on events or terminal resize.

mod component;
mod components;
mod event;
pub mod markdown;
mod ui;

use log::{debug, info, warn};
use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use tokio::task::AbortHandle;

use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::render::{WORD_PACE, render_streaming};
use crate::core::state::App;
use crate::inference::{
    AttemptEvent, CompletionClient, Conversation, OpenRouterProvider, RequestConfig,
};
use crate::tui::component::EventHandler;
use crate::tui::components::{
    InputBox, InputEvent, MessageListState, ModelPickerEvent, ModelPickerState,
};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

const BUSY_POLL: Duration = Duration::from_millis(30);
const IDLE_POLL: Duration = Duration::from_millis(500);

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub message_list: MessageListState,
    pub input_box: InputBox,
    /// Model picker overlay (None = hidden)
    pub model_picker: Option<ModelPickerState>,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            message_list: MessageListState::new(),
            input_box: InputBox::new(),
            model_picker: None,
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,                        // Show cursor for input editing
            SetCursorStyle::SteadyBlock, // Non-blinking: redraws reset the blink timer
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, steady block cursor)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), DisableMouseCapture, DisableBracketedPaste, Hide);
    }
}

/// Build the completion client from a resolved config.
pub fn build_client(config: &ResolvedConfig) -> CompletionClient {
    let provider = OpenRouterProvider::new(Some(config.base_url.clone()), config.system_prompt.clone())
        .with_identity(config.referer.clone(), config.title.clone());
    CompletionClient::new(Arc::new(provider))
}

/// Background work started by the reducer. Aborted on quit.
struct Tasks {
    client: CompletionClient,
    tx: mpsc::Sender<Action>,
    handles: Vec<AbortHandle>,
}

impl Tasks {
    /// Runs an effect. Returns true if the app should quit.
    fn apply(&mut self, effect: Effect, app: &App) -> bool {
        match effect {
            Effect::None => false,
            Effect::Quit => true,
            Effect::SpawnRequest => {
                self.handles.retain(|h| !h.is_finished());
                self.handles.push(spawn_request(
                    self.client.clone(),
                    app.conversation.clone(),
                    app.request_config(),
                    self.tx.clone(),
                ));
                false
            }
            Effect::SpawnRender(raw) => {
                self.handles.retain(|h| !h.is_finished());
                self.handles.push(spawn_render(raw, self.tx.clone()));
                false
            }
        }
    }

    fn abort_all(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let mut app = App::from_config(&config);
    let mut tui = TuiState::new();

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel();
    let mut tasks = Tasks {
        client: build_client(&config),
        tx,
        handles: Vec::new(),
    };
    info!(
        "Session ready (provider={}, model={})",
        tasks.client.provider_name(),
        app.settings.model
    );

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    let mut needs_redraw = true; // Force first frame

    loop {
        if needs_redraw {
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui))?;
            needs_redraw = false;
        }

        let timeout = if app.is_loading() { BUSY_POLL } else { IDLE_POLL };
        let first_event = poll_event_timeout(timeout);

        // Process first event + drain ALL pending events before next draw
        let mut should_quit = false;
        if first_event.is_some() {
            needs_redraw = true;
        }
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if handle_event(event, &mut app, &mut tui, &mut tasks) {
                should_quit = true;
                break;
            }
        }

        // Handle background task actions
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);
            let effect = update(&mut app, action);
            if tasks.apply(effect, &app) {
                should_quit = true;
            }
        }

        if should_quit {
            break;
        }
    }

    tasks.abort_all();
    ratatui::restore();
    Ok(())
}

/// Routes one terminal event. Returns true if the app should quit.
fn handle_event(event: TuiEvent, app: &mut App, tui: &mut TuiState, tasks: &mut Tasks) -> bool {
    // Resize just needs a redraw (already flagged by the caller)
    if matches!(event, TuiEvent::Resize) {
        return false;
    }

    // Ctrl+C always quits, even with the picker open
    if matches!(event, TuiEvent::ForceQuit) {
        return tasks.apply(update(app, Action::Quit), app);
    }

    // When the model picker is open, route all events to it
    if let Some(picker) = tui.model_picker.as_mut() {
        match picker.handle_event(&event) {
            Some(ModelPickerEvent::Select(model)) => {
                update(app, Action::SelectModel(model.name));
                tui.model_picker = None;
            }
            Some(ModelPickerEvent::Dismiss) => tui.model_picker = None,
            None => {}
        }
        return false;
    }

    let action = match event {
        TuiEvent::OpenModelPicker => {
            tui.model_picker = Some(ModelPickerState::new(
                app.settings.models.clone(),
                &app.settings.model,
            ));
            return false;
        }
        TuiEvent::ScrollUp
        | TuiEvent::ScrollDown
        | TuiEvent::ScrollPageUp
        | TuiEvent::ScrollPageDown => {
            tui.message_list.handle_event(&event);
            return false;
        }
        TuiEvent::ClearHistory => {
            if !app.is_loading() {
                tui.message_list.reset();
            }
            Action::ClearHistory
        }
        TuiEvent::SeedExamples => Action::SeedExamples,
        TuiEvent::CycleTemperature => Action::CycleTemperature,
        TuiEvent::CycleRetries => Action::CycleRetries,
        _ => {
            tui.input_box.locked = app.is_loading();
            match tui.input_box.handle_event(&event) {
                Some(InputEvent::Submit(text)) => {
                    // A new question always scrolls into view
                    tui.message_list.stick_to_bottom = true;
                    Action::Submit(text)
                }
                Some(InputEvent::ContentChanged) | None => return false,
            }
        }
    };
    tasks.apply(update(app, action), app)
}

fn spawn_request(
    client: CompletionClient,
    conversation: Conversation,
    config: RequestConfig,
    tx: mpsc::Sender<Action>,
) -> AbortHandle {
    info!(
        "Spawning completion request ({} messages, model={})",
        conversation.len(),
        config.model
    );

    let handle = tokio::spawn(async move {
        let attempt_tx = tx.clone();
        let result = client
            .complete_observed(&conversation, &config, move |event| {
                let action = match event {
                    AttemptEvent::Started {
                        number,
                        max_attempts,
                    } => Action::AttemptStarted {
                        number,
                        max_attempts,
                    },
                    AttemptEvent::Finished(attempt) => match attempt.error {
                        Some(error) => Action::AttemptFailed {
                            number: attempt.number,
                            error,
                        },
                        None => return,
                    },
                };
                if attempt_tx.send(action).is_err() {
                    warn!("Failed to report attempt: receiver dropped");
                }
            })
            .await;

        let action = match result {
            Ok(raw) => Action::CompletionSucceeded(raw),
            Err(err) => Action::CompletionFailed(err),
        };
        if tx.send(action).is_err() {
            warn!("Failed to send completion result: receiver dropped");
        }
    });
    handle.abort_handle()
}

fn spawn_render(raw: String, tx: mpsc::Sender<Action>) -> AbortHandle {
    debug!("Spawning typewriter for {} bytes", raw.len());

    let handle = tokio::spawn(async move {
        let word_tx = tx.clone();
        let text = render_streaming(&raw, WORD_PACE, |token| {
            if word_tx.send(Action::WordEmitted(token.clone())).is_err() {
                warn!("Failed to send word: receiver dropped");
            }
        })
        .await;
        debug!("Typewriter finished ({} bytes shown)", text.len());
        if tx.send(Action::RenderFinished).is_err() {
            warn!("Failed to send RenderFinished: receiver dropped");
        }
    });
    handle.abort_handle()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::TurnState;
    use crate::inference::CompletionError;
    use crate::test_support::{ScriptedProvider, test_app};

    fn tasks(provider: ScriptedProvider) -> (Tasks, mpsc::Receiver<Action>) {
        let (tx, rx) = mpsc::channel();
        let client = CompletionClient::new(Arc::new(provider)).with_backoff(Duration::from_millis(1));
        (
            Tasks {
                client,
                tx,
                handles: Vec::new(),
            },
            rx,
        )
    }

    /// Feeds every queued background action through the reducer until idle.
    async fn drive(app: &mut App, tasks: &mut Tasks, rx: &mpsc::Receiver<Action>) {
        for _ in 0..500 {
            while let Ok(action) = rx.try_recv() {
                let effect = update(app, action);
                tasks.apply(effect, app);
            }
            if !app.is_loading() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("turn never finished: {:?}", app.turn);
    }

    fn type_and_send(text: &str, app: &mut App, tui: &mut TuiState, tasks: &mut Tasks) {
        for c in text.chars() {
            handle_event(TuiEvent::InputChar(c), app, tui, tasks);
        }
        handle_event(TuiEvent::Submit, app, tui, tasks);
    }

    #[tokio::test]
    async fn test_full_turn_types_out_cleaned_reply() {
        let provider = ScriptedProvider::new(vec![Ok("**Goal:** calm walks".into())]);
        let (mut tasks, rx) = tasks(provider);
        let mut app = test_app();
        let mut tui = TuiState::new();

        type_and_send("leash pulling?", &mut app, &mut tui, &mut tasks);
        assert!(app.is_loading());
        drive(&mut app, &mut tasks, &rx).await;

        assert_eq!(app.turn, TurnState::Done);
        let last = app.conversation.last().unwrap();
        assert_eq!(last.content, "Goal: calm walks \n");
        assert_eq!(
            app.decorated.get(&(app.conversation.len() - 1)).map(String::as_str),
            Some("<strong>🌟 Goal:</strong> calm walks \n")
        );
    }

    #[tokio::test]
    async fn test_decode_failure_is_retried_then_reported() {
        let provider = ScriptedProvider::new(vec![
            Err(CompletionError::Decode("bad json".into())),
            Err(CompletionError::Decode("bad json".into())),
        ]);
        let (mut tasks, rx) = tasks(provider);
        let mut app = test_app();
        let mut tui = TuiState::new();

        type_and_send("sit?", &mut app, &mut tui, &mut tasks);
        drive(&mut app, &mut tasks, &rx).await;

        assert_eq!(app.turn, TurnState::Failed);
        assert!(app.error.as_deref().unwrap().contains("rephrasing"));
        assert_eq!(
            app.conversation.last().unwrap().content,
            CompletionError::Decode(String::new()).fallback_message()
        );
    }

    #[tokio::test]
    async fn test_shortcuts_map_to_actions() {
        let (mut tasks, _rx) = tasks(ScriptedProvider::new(vec![]));
        let mut app = test_app();
        let mut tui = TuiState::new();

        handle_event(TuiEvent::CycleTemperature, &mut app, &mut tui, &mut tasks);
        assert_eq!(app.settings.temperature, 0.6);

        handle_event(TuiEvent::CycleRetries, &mut app, &mut tui, &mut tasks);
        assert_eq!(app.settings.max_retries, 3);

        handle_event(TuiEvent::SeedExamples, &mut app, &mut tui, &mut tasks);
        assert!(app.conversation.last().unwrap().has_badges());

        handle_event(TuiEvent::ClearHistory, &mut app, &mut tui, &mut tasks);
        assert_eq!(app.conversation.len(), 1);

        assert!(handle_event(TuiEvent::ForceQuit, &mut app, &mut tui, &mut tasks));
    }

    #[tokio::test]
    async fn test_model_picker_selects_model() {
        let (mut tasks, _rx) = tasks(ScriptedProvider::new(vec![]));
        let mut app = test_app();
        app.settings.models = vec![
            crate::core::config::ModelEntry {
                name: "test-model".into(),
                description: None,
            },
            crate::core::config::ModelEntry {
                name: "other/model".into(),
                description: None,
            },
        ];
        let mut tui = TuiState::new();

        handle_event(TuiEvent::OpenModelPicker, &mut app, &mut tui, &mut tasks);
        assert!(tui.model_picker.is_some());

        // Typing goes to the picker, not the input box
        handle_event(TuiEvent::InputChar('x'), &mut app, &mut tui, &mut tasks);
        assert!(tui.input_box.buffer.is_empty());

        handle_event(TuiEvent::CursorDown, &mut app, &mut tui, &mut tasks);
        handle_event(TuiEvent::Submit, &mut app, &mut tui, &mut tasks);
        assert!(tui.model_picker.is_none());
        assert_eq!(app.settings.model, "other/model");
    }

    #[tokio::test]
    async fn test_submit_while_loading_keeps_draft() {
        let (mut tasks, _rx) = tasks(ScriptedProvider::new(vec![Ok("ok".into())]));
        let mut app = test_app();
        let mut tui = TuiState::new();

        type_and_send("first", &mut app, &mut tui, &mut tasks);
        assert!(app.is_loading());

        type_and_send("second", &mut app, &mut tui, &mut tasks);
        assert_eq!(tui.input_box.buffer, "second");
        assert_eq!(app.conversation.user_turns(), 1);
        tasks.abort_all();
    }
}
