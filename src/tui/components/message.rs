use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Text;
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::core::render::in_progress;
use crate::inference::Role;
use crate::tui::component::Component;
use crate::tui::markdown::{self, Markup};

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

/// What a message shows and how it is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Body<'a> {
    /// Markdown with the inline display tags honored.
    Markup(&'a str),
    /// Markdown with any tags shown verbatim.
    Markdown(&'a str),
    /// A reply still being typed out. Shown raw with a cursor.
    Typing(&'a str),
}

/// A single chat message inside a rounded, role-colored border.
///
/// The styled text is produced once in [`Message::new`] so that
/// [`Message::height`] and rendering agree exactly. Stored messages are built
/// once and kept by the message list; only the typing reply is rebuilt per frame.
///
/// # Styling
///
/// - **User** (green): questions from the human
/// - **Assistant** (blue): the trainer's replies
///
/// The border is dimmed except on a reply that is still being typed.
pub struct Message {
    role: Role,
    text: Text<'static>,
    active: bool,
}

impl Message {
    pub fn new(role: Role, body: Body<'_>) -> Self {
        let fg = role_color(role);
        let (text, active) = match body {
            Body::Markup(content) => (markdown::render(content.trim(), fg, Markup::Allowed), false),
            Body::Markdown(content) => {
                (markdown::render(content.trim(), fg, Markup::Escaped), false)
            }
            Body::Typing(partial) => (
                Text::styled(in_progress(partial), Style::default().fg(fg)),
                true,
            ),
        };
        Self { role, text, active }
    }

    fn paragraph(&self) -> Paragraph<'_> {
        Paragraph::new(self.text.clone()).wrap(Wrap { trim: false })
    }

    /// Rows this message occupies at the given outer width, borders included.
    pub fn height(&self, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            // Too narrow for borders + padding; still take up a row.
            return 1;
        }
        let lines = self.paragraph().line_count(content_width).max(1);
        u16::try_from(lines)
            .unwrap_or(u16::MAX)
            .saturating_add(VERTICAL_OVERHEAD)
    }
}

fn role_color(role: Role) -> Color {
    match role {
        Role::User => Color::Green,
        Role::Assistant | Role::System => Color::Blue,
    }
}

fn role_title(role: Role) -> &'static str {
    match role {
        Role::User => "you",
        Role::Assistant | Role::System => "trainer",
    }
}

impl Widget for &Message {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().fg(role_color(self.role));
        let border_style = if self.active {
            style.add_modifier(Modifier::BOLD)
        } else {
            style.add_modifier(Modifier::DIM)
        };

        let block = Block::bordered()
            .title(role_title(self.role))
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));

        let inner_area = block.inner(area);
        block.render(area, buf);
        self.paragraph().render(inner_area, buf);
    }
}

impl Component for Message {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(&*self, area);
    }
}
