use crate::core::state::App;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{LandingPage, MessageList, ModelPicker, TitleBar};

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Paragraph, Wrap};

/// Rows kept for the greeting below the landing page.
const MIN_CHAT_HEIGHT: u16 = 5;

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState) {
    use Constraint::{Length, Min};

    let area = frame.area();
    let input_height = tui.input_box.calculate_height(area.width);
    let error_height = app.error.as_deref().map_or(0, |e| error_height(e, area.width));

    let layout = Layout::vertical([Length(1), Min(0), Length(error_height), Length(input_height)]);
    let [title_area, main_area, error_area, input_area] = layout.areas(area);

    TitleBar::from_app(app, !tui.message_list.stick_to_bottom).render(frame, title_area);

    let landing_height = LandingPage::required_height(main_area.width);
    let chat_area = if !app.has_user_messages()
        && main_area.height >= landing_height + MIN_CHAT_HEIGHT
    {
        let [landing_area, chat_area] =
            Layout::vertical([Length(landing_height), Min(0)]).areas(main_area);
        LandingPage.render(frame, landing_area);
        chat_area
    } else {
        main_area
    };
    MessageList::new(&mut tui.message_list, app).render(frame, chat_area);

    if let Some(error) = &app.error {
        draw_error(frame, error_area, error);
    }

    tui.input_box.render(frame, input_area);

    if let Some(picker) = tui.model_picker.as_mut() {
        ModelPicker::new(picker, &app.settings.model).render(frame, area);
    }
}

fn error_block() -> Block<'static> {
    Block::bordered()
        .border_type(BorderType::Rounded)
        .title("Error")
        .border_style(Style::default().fg(Color::Red))
}

fn error_paragraph(error: &str) -> Paragraph<'_> {
    Paragraph::new(error)
        .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
        .wrap(Wrap { trim: true })
}

/// Rows the error panel needs, borders included.
fn error_height(error: &str, width: u16) -> u16 {
    let lines = error_paragraph(error).line_count(width.saturating_sub(2)).max(1);
    u16::try_from(lines).unwrap_or(u16::MAX).saturating_add(2)
}

fn draw_error(frame: &mut Frame, area: Rect, error: &str) {
    frame.render_widget(error_paragraph(error).block(error_block()), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Action, update};
    use crate::test_support::test_app;
    use crate::tui::components::ModelPickerState;
    use crate::core::config::ModelEntry;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn screen(app: &App, tui: &mut TuiState, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| draw_ui(f, app, tui)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_first_screen_shows_landing_and_greeting() {
        let app = test_app();
        let mut tui = TuiState::new();
        let text = screen(&app, &mut tui, 120, 40);

        assert!(text.contains("Heel (model: test-model)"));
        assert!(text.contains("AI Dog Training Expert"));
        assert!(text.contains("Dog Training Expert."));
        assert!(text.contains("Ask about dog training..."));
    }

    #[test]
    fn test_landing_hidden_after_first_question() {
        let mut app = test_app();
        update(&mut app, Action::Submit("How do I teach sit?".into()));
        let mut tui = TuiState::new();
        let text = screen(&app, &mut tui, 120, 40);

        assert!(!text.contains("Quick start"));
        assert!(text.contains("How do I teach sit?"));
    }

    #[test]
    fn test_landing_skipped_on_short_terminal() {
        let app = test_app();
        let mut tui = TuiState::new();
        let text = screen(&app, &mut tui, 120, 12);
        assert!(!text.contains("Quick start"));
    }

    #[test]
    fn test_error_panel_shows_hint() {
        let mut app = test_app();
        app.settings.api_key = None;
        update(&mut app, Action::Submit("hi".into()));
        let mut tui = TuiState::new();
        let text = screen(&app, &mut tui, 120, 40);

        assert!(text.contains("Error"));
        assert!(text.contains("OPENROUTER_API_KEY"));
    }

    #[test]
    fn test_model_picker_overlay() {
        let app = test_app();
        let mut tui = TuiState::new();
        tui.model_picker = Some(ModelPickerState::new(
            vec![ModelEntry {
                name: "test-model".into(),
                description: Some("the one in use".into()),
            }],
            "test-model",
        ));
        let text = screen(&app, &mut tui, 120, 40);
        assert!(text.contains("Models"));
        assert!(text.contains("the one in use"));
    }

    #[test]
    fn test_error_height_counts_lines() {
        assert_eq!(error_height("one\ntwo", 80), 4);
        assert_eq!(error_height("", 80), 3);
    }
}
