//! # Model Picker Component
//!
//! Overlay for switching the OpenRouter model at runtime. Opened with Ctrl+O.
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `ModelPickerState` lives in `TuiState` while the overlay is open
//! - `ModelPicker` is created each frame with borrowed state

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::core::config::ModelEntry;
use crate::tui::event::TuiEvent;

/// Persistent state for the model picker overlay.
pub struct ModelPickerState {
    pub models: Vec<ModelEntry>,
    pub list_state: ListState,
}

impl ModelPickerState {
    /// Opens with the active model highlighted.
    pub fn new(models: Vec<ModelEntry>, current_model: &str) -> Self {
        let selected = models
            .iter()
            .position(|m| m.name == current_model)
            .or((!models.is_empty()).then_some(0));
        Self {
            models,
            list_state: ListState::default().with_selected(selected),
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.list_state.selected()
    }

    /// Handle a key event, returning a ModelPickerEvent if the overlay should act.
    pub fn handle_event(&mut self, event: &TuiEvent) -> Option<ModelPickerEvent> {
        match event {
            TuiEvent::Escape => Some(ModelPickerEvent::Dismiss),
            TuiEvent::CursorUp => {
                if let Some(i) = self.selected() {
                    self.list_state.select(Some(i.saturating_sub(1)));
                }
                None
            }
            TuiEvent::CursorDown => {
                if let Some(i) = self.selected() {
                    let last = self.models.len().saturating_sub(1);
                    self.list_state.select(Some((i + 1).min(last)));
                }
                None
            }
            TuiEvent::Submit => self
                .selected()
                .and_then(|i| self.models.get(i))
                .map(|model| ModelPickerEvent::Select(model.clone())),
            _ => None,
        }
    }
}

/// Events emitted by the model picker.
#[derive(Debug, PartialEq)]
pub enum ModelPickerEvent {
    Select(ModelEntry),
    Dismiss,
}

/// Transient render wrapper for the model picker overlay.
pub struct ModelPicker<'a> {
    state: &'a mut ModelPickerState,
    current_model: &'a str,
}

impl<'a> ModelPicker<'a> {
    pub fn new(state: &'a mut ModelPickerState, current_model: &'a str) -> Self {
        Self {
            state,
            current_model,
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_rect(70, 60, area);

        // Clear underlying content
        frame.render_widget(Clear, overlay);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Models ")
            .title_alignment(Alignment::Left)
            .title_bottom(Line::from(" ↑↓ Move  Enter Select  Esc Back ").centered())
            .padding(Padding::horizontal(1));

        if self.state.models.is_empty() {
            let empty = Paragraph::new(
                "No models configured.\nAdd [[models]] entries to ~/.heel/config.toml",
            )
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(block);
            frame.render_widget(empty, overlay);
            return;
        }

        let inner_width = overlay.width.saturating_sub(4) as usize; // borders + padding
        let selected = self.state.selected();

        let items: Vec<ListItem> = self
            .state
            .models
            .iter()
            .enumerate()
            .map(|(i, model)| {
                let is_selected = selected == Some(i);
                let active_marker = if model.name == self.current_model { " *" } else { "" };
                let desc = model
                    .description
                    .as_deref()
                    .map(|d| format!("  {d}"))
                    .unwrap_or_default();

                let name_width = inner_width
                    .saturating_sub(active_marker.len())
                    .saturating_sub(desc.width());
                let name = truncate_str(&model.name, name_width);
                let padded_name = format!("{name:<name_width$}");

                let style = if is_selected {
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else if !active_marker.is_empty() {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default().fg(Color::Gray)
                };
                let desc_style = if is_selected {
                    style
                } else {
                    Style::default().fg(Color::DarkGray)
                };

                ListItem::new(Line::from(vec![
                    Span::styled(padded_name, style),
                    Span::styled(desc, desc_style),
                    Span::styled(active_marker, style),
                ]))
            })
            .collect();

        let list = List::new(items).block(block);
        frame.render_stateful_widget(list, overlay, &mut self.state.list_state);
    }
}

/// Truncate a string to fit within `max_width` columns, adding "..." if needed.
fn truncate_str(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > max_width - 3 {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str("...");
    out
}

/// Compute a centered rect using percentage of the outer rect.
fn centered_rect(percent_x: u16, percent_y: u16, outer: Rect) -> Rect {
    let [_, center_v, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(outer);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(center_v);
    center
}
