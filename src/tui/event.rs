use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};

/// TUI-specific input events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiEvent {
    // Core actions (mapped onto core::Action)
    ForceQuit,
    Submit,
    ClearHistory,
    SeedExamples,
    CycleTemperature,
    CycleRetries,

    // TUI-local events (handled directly in TUI)
    InputChar(char),
    Paste(String),
    Backspace,
    Delete,
    CursorLeft,
    CursorRight,
    CursorUp,
    CursorDown,
    CursorHome,
    CursorEnd,
    Escape,
    ScrollUp,
    ScrollDown,
    ScrollPageUp,
    ScrollPageDown,
    OpenModelPicker,
    Resize,
}

/// Poll for an event without blocking (returns immediately)
pub fn poll_event_immediate() -> Option<TuiEvent> {
    poll_event_timeout(Duration::ZERO)
}

/// Poll for an event, blocking up to `timeout`
pub fn poll_event_timeout(timeout: Duration) -> Option<TuiEvent> {
    match event::poll(timeout) {
        Ok(true) => {}
        Ok(false) => return None,
        Err(e) => {
            log::warn!("event poll failed: {e}");
            return None;
        }
    }
    match event::read() {
        Ok(event) => translate(event),
        Err(e) => {
            log::warn!("event read failed: {e}");
            None
        }
    }
}

fn translate(event: Event) -> Option<TuiEvent> {
    match event {
        Event::Key(key) => translate_key(key),
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollUp => Some(TuiEvent::ScrollUp),
            MouseEventKind::ScrollDown => Some(TuiEvent::ScrollDown),
            _ => None,
        },
        Event::Paste(data) => Some(TuiEvent::Paste(data)),
        Event::Resize(..) => Some(TuiEvent::Resize),
        _ => None,
    }
}

fn translate_key(key: KeyEvent) -> Option<TuiEvent> {
    // Some terminals report releases too
    if key.kind == KeyEventKind::Release {
        return None;
    }
    log::trace!("key event: {:?} with modifiers {:?}", key.code, key.modifiers);

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(TuiEvent::ForceQuit),
            KeyCode::Char('l') => Some(TuiEvent::ClearHistory),
            KeyCode::Char('e') => Some(TuiEvent::SeedExamples),
            KeyCode::Char('t') => Some(TuiEvent::CycleTemperature),
            KeyCode::Char('r') => Some(TuiEvent::CycleRetries),
            KeyCode::Char('o') => Some(TuiEvent::OpenModelPicker),
            // Ctrl+J is ASCII LF; Ctrl+Enter sends this in most terminals
            KeyCode::Char('j') => Some(TuiEvent::InputChar('\n')),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char(c) => Some(TuiEvent::InputChar(c)),
        KeyCode::Backspace => Some(TuiEvent::Backspace),
        KeyCode::Delete => Some(TuiEvent::Delete),
        KeyCode::Enter => Some(TuiEvent::Submit),
        KeyCode::Esc => Some(TuiEvent::Escape),
        KeyCode::Left => Some(TuiEvent::CursorLeft),
        KeyCode::Right => Some(TuiEvent::CursorRight),
        KeyCode::Up => Some(TuiEvent::CursorUp),
        KeyCode::Down => Some(TuiEvent::CursorDown),
        KeyCode::Home => Some(TuiEvent::CursorHome),
        KeyCode::End => Some(TuiEvent::CursorEnd),
        KeyCode::PageUp => Some(TuiEvent::ScrollPageUp),
        KeyCode::PageDown => Some(TuiEvent::ScrollPageDown),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, MouseEvent};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn control_shortcuts() {
        let ctrl = KeyModifiers::CONTROL;
        assert_eq!(translate(key(KeyCode::Char('c'), ctrl)), Some(TuiEvent::ForceQuit));
        assert_eq!(translate(key(KeyCode::Char('l'), ctrl)), Some(TuiEvent::ClearHistory));
        assert_eq!(translate(key(KeyCode::Char('e'), ctrl)), Some(TuiEvent::SeedExamples));
        assert_eq!(translate(key(KeyCode::Char('t'), ctrl)), Some(TuiEvent::CycleTemperature));
        assert_eq!(translate(key(KeyCode::Char('r'), ctrl)), Some(TuiEvent::CycleRetries));
        assert_eq!(translate(key(KeyCode::Char('o'), ctrl)), Some(TuiEvent::OpenModelPicker));
        assert_eq!(translate(key(KeyCode::Char('j'), ctrl)), Some(TuiEvent::InputChar('\n')));
        assert_eq!(translate(key(KeyCode::Char('x'), ctrl)), None);
    }

    #[test]
    fn plain_keys() {
        let none = KeyModifiers::NONE;
        assert_eq!(translate(key(KeyCode::Char('s'), none)), Some(TuiEvent::InputChar('s')));
        assert_eq!(
            translate(key(KeyCode::Char('S'), KeyModifiers::SHIFT)),
            Some(TuiEvent::InputChar('S'))
        );
        assert_eq!(translate(key(KeyCode::Enter, none)), Some(TuiEvent::Submit));
        assert_eq!(translate(key(KeyCode::Esc, none)), Some(TuiEvent::Escape));
        assert_eq!(translate(key(KeyCode::PageUp, none)), Some(TuiEvent::ScrollPageUp));
    }

    #[test]
    fn key_release_ignored() {
        let release = KeyEvent::new_with_kind_and_state(
            KeyCode::Char('a'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
            KeyEventState::NONE,
        );
        assert_eq!(translate(Event::Key(release)), None);
    }

    #[test]
    fn mouse_wheel_scrolls() {
        let wheel = |kind| {
            Event::Mouse(MouseEvent {
                kind,
                column: 0,
                row: 0,
                modifiers: KeyModifiers::NONE,
            })
        };
        assert_eq!(translate(wheel(MouseEventKind::ScrollUp)), Some(TuiEvent::ScrollUp));
        assert_eq!(translate(wheel(MouseEventKind::ScrollDown)), Some(TuiEvent::ScrollDown));
        assert_eq!(translate(wheel(MouseEventKind::Moved)), None);
    }

    #[test]
    fn paste_and_resize() {
        assert_eq!(
            translate(Event::Paste("sit\nstay".into())),
            Some(TuiEvent::Paste("sit\nstay".into()))
        );
        assert_eq!(translate(Event::Resize(80, 24)), Some(TuiEvent::Resize));
    }
}
