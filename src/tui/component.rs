use ratatui::Frame;
use ratatui::layout::Rect;

use crate::tui::event::TuiEvent;

/// Something that draws itself into a region of the frame.
///
/// Implementors are short-lived views built each frame from the session
/// state they borrow (`TitleBar`, `MessageList`, `ModelPicker`). Long-lived
/// presentation state such as scroll position lives in the `*State` structs
/// they wrap, which is why `render` takes `&mut self`.
pub trait Component {
    fn render(&mut self, frame: &mut Frame, area: Rect);
}

/// Turns raw terminal events into a component's own events.
pub trait EventHandler {
    type Event;

    /// Returns `None` when the event was consumed or ignored.
    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event>;
}
