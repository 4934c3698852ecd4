//! # TitleBar Component
//!
//! Top status bar showing the live request settings and turn status.
//!
//! ## Responsibilities
//!
//! - Display current model name, creativity and retry budget
//! - Display the status message ("Analyzing your query...", "Max retries: 3")
//! - Show "↓ New" indicator when the view is scrolled away from the bottom
//!
//! ## Design Decisions
//!
//! TitleBar is purely presentational. It receives all data as props and has
//! no internal state:
//!
//! ```rust,ignore
//! let mut title_bar = TitleBar::from_app(&app, !tui.message_list.stick_to_bottom);
//! title_bar.render(frame, area);
//! ```
//!
//! ## Conditional Formatting
//!
//! 1. **Unseen content**: `"Heel (model: m) | temp 0.5 | retries 2 | Typing... | ↓ New"`
//! 2. **Status message**: `"Heel (model: m) | temp 0.5 | retries 2 | Typing..."`
//! 3. **Default**: `"Heel (model: m) | temp 0.5 | retries 2"`

use crate::core::state::App;
use crate::tui::component::Component;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Span;

/// Top status bar component.
pub struct TitleBar {
    pub model_name: String,
    pub temperature: f32,
    pub max_retries: u8,
    /// Transient status, e.g. "Analyzing your query..." or "Creativity: 0.7"
    pub status_message: String,
    /// Whether there's content below the current scroll position
    pub has_unseen_content: bool,
}

impl TitleBar {
    pub fn new(
        model_name: String,
        temperature: f32,
        max_retries: u8,
        status_message: String,
        has_unseen_content: bool,
    ) -> Self {
        Self {
            model_name,
            temperature,
            max_retries,
            status_message,
            has_unseen_content,
        }
    }

    pub fn from_app(app: &App, has_unseen_content: bool) -> Self {
        Self::new(
            app.settings.model.clone(),
            app.settings.temperature,
            app.settings.max_retries,
            app.status_message.clone(),
            has_unseen_content,
        )
    }

    pub fn text(&self) -> String {
        let mut title = format!(
            "Heel (model: {}) | temp {:.1} | retries {}",
            self.model_name, self.temperature, self.max_retries
        );
        if !self.status_message.is_empty() {
            title.push_str(" | ");
            title.push_str(&self.status_message);
        }
        if self.has_unseen_content {
            title.push_str(" | ↓ New");
        }
        title
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let span = Span::styled(self.text(), Style::default().fg(Color::Gray));
        frame.render_widget(span, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_app;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn draw(title_bar: &mut TitleBar) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 1)).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                title_bar.render(f, area);
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_title_bar_with_unseen_content() {
        let mut title_bar = TitleBar::new("gpt-4o".into(), 0.7, 3, "Typing...".into(), true);
        let text = draw(&mut title_bar);

        assert!(text.contains("Heel (model: gpt-4o)"));
        assert!(text.contains("temp 0.7"));
        assert!(text.contains("retries 3"));
        assert!(text.contains("Typing..."));
        assert!(text.contains("↓ New"));
    }

    #[test]
    fn test_title_bar_default_no_status() {
        let title_bar = TitleBar::new("gpt-4o".into(), 0.5, 2, String::new(), false);
        assert_eq!(title_bar.text(), "Heel (model: gpt-4o) | temp 0.5 | retries 2");
    }

    #[test]
    fn test_title_bar_from_app() {
        let mut app = test_app();
        app.settings.temperature = 1.0;
        app.status_message = "Analyzing your query...".into();

        let title_bar = TitleBar::from_app(&app, false);
        assert_eq!(
            title_bar.text(),
            "Heel (model: test-model) | temp 1.0 | retries 2 | Analyzing your query..."
        );
    }
}
