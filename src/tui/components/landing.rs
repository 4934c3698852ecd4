//! # Landing Page Component
//!
//! Welcome panel shown above the greeting until the first question is asked:
//! a title, a caption, four feature cards and a short quick-start guide.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Paragraph};

use crate::tui::component::Component;

pub const TITLE: &str = "🐕 AI Dog Training Expert";
pub const CAPTION: &str =
    "Get professional training advice, behavior solutions, and puppy care tips 24/7";

/// `(heading, blurb)` for each feature card, left to right.
pub const FEATURES: [(&str, &str); 4] = [
    ("💡 Expert Tips", "Proven training techniques"),
    ("⚠️ Safety First", "Critical warnings highlighted"),
    ("📅 Progress Tracking", "Follow structured plans"),
    ("🐶 Breed Specific", "Tailored advice when possible"),
];

pub const QUICK_START: [&str; 3] = [
    "Type a question below and press Enter",
    "Press Ctrl+E for example questions",
    "Ctrl+T tunes creativity, Ctrl+R the retry budget",
];

const CARD_HEIGHT: u16 = 4;
/// Cards sit side by side above this width, otherwise they are skipped.
const MIN_CARD_ROW_WIDTH: u16 = 64;

pub struct LandingPage;

impl LandingPage {
    /// Rows needed to show the caption and quick start at `width`.
    fn text_height(width: u16) -> u16 {
        let width = usize::from(width.max(1));
        let caption = textwrap::wrap(CAPTION, width).len() as u16;
        // title, blank, caption, blank, "Quick start", steps
        1 + 1 + caption + 1 + 1 + QUICK_START.len() as u16
    }

    /// Total rows the landing page wants at `width`.
    pub fn required_height(width: u16) -> u16 {
        let cards = if width >= MIN_CARD_ROW_WIDTH { CARD_HEIGHT + 1 } else { 0 };
        Self::text_height(width) + cards
    }

    fn header(width: u16) -> Vec<Line<'static>> {
        let mut lines = vec![
            Line::from(Span::styled(
                TITLE,
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::default(),
        ];
        for row in textwrap::wrap(CAPTION, usize::from(width.max(1))) {
            lines.push(Line::from(Span::styled(
                row.into_owned(),
                Style::default().fg(Color::Gray),
            )));
        }
        lines
    }

    fn quick_start() -> Vec<Line<'static>> {
        let mut lines = vec![Line::from(Span::styled(
            "Quick start",
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        lines.extend(QUICK_START.iter().enumerate().map(|(i, step)| {
            Line::from(vec![
                Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::raw(*step),
            ])
        }));
        lines
    }

    fn render_cards(frame: &mut Frame, area: Rect) {
        let columns = Layout::horizontal([Constraint::Fill(1); FEATURES.len()])
            .spacing(1)
            .split(area);
        for ((heading, blurb), column) in FEATURES.iter().zip(columns.iter()) {
            let card = Paragraph::new(vec![
                Line::from(Span::styled(
                    *heading,
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(*blurb, Style::default().fg(Color::Gray))),
            ])
            .alignment(Alignment::Center)
            .block(
                Block::bordered()
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
            frame.render_widget(card, *column);
        }
    }
}

impl Component for LandingPage {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let header = Self::header(area.width);
        let show_cards = area.width >= MIN_CARD_ROW_WIDTH;

        let [header_area, _, cards_area, _, guide_area] = Layout::vertical([
            Constraint::Length(header.len() as u16),
            Constraint::Length(1),
            Constraint::Length(if show_cards { CARD_HEIGHT } else { 0 }),
            Constraint::Length(if show_cards { 1 } else { 0 }),
            Constraint::Length(QUICK_START.len() as u16 + 1),
        ])
        .flex(Flex::Center)
        .areas(area);

        frame.render_widget(
            Paragraph::new(header).alignment(Alignment::Center),
            header_area,
        );
        if show_cards {
            Self::render_cards(frame, cards_area);
        }
        frame.render_widget(
            Paragraph::new(Self::quick_start()).alignment(Alignment::Center),
            guide_area,
        );
    }
}
