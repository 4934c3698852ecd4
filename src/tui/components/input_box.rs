//! # InputBox Component
//!
//! Multi-line question editor at the bottom of the screen.
//!
//! ## Responsibilities
//!
//! - Capture text input and paste
//! - Handle editing (backspace, delete, cursor movement)
//! - Handle submission (Enter)
//! - Show a placeholder when empty and the key hints underneath
//!
//! Text is hard-wrapped by display width, so every visual row maps to one
//! contiguous byte range of the buffer. Cursor movement works on those rows.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Padding, Paragraph};
use unicode_width::UnicodeWidthChar;

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Border (2) + padding (2) consumed horizontally by the bordered block
const HORIZONTAL_OVERHEAD: u16 = 4;
/// Top + bottom borders consumed vertically
const VERTICAL_OVERHEAD: u16 = 2;
/// Maximum visible content lines before internal scrolling kicks in
pub const MAX_VISIBLE_LINES: u16 = 5;

pub const PLACEHOLDER: &str = "Ask about dog training...";
const KEY_HINTS: &str =
    " Enter send · Ctrl+J newline · ^E examples · ^L clear · ^T temp · ^R retries · ^O model · ^C quit ";

/// High-level events emitted by the InputBox
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// User submitted the text (Enter pressed)
    Submit(String),
    ContentChanged,
}

/// A visual row: `start..end` bytes of the buffer, newline excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Row {
    start: usize,
    end: usize,
}

/// Text input component.
///
/// # Props
///
/// - `locked`: a turn is in flight, so Enter keeps the text instead of sending it
pub struct InputBox {
    pub buffer: String,
    pub locked: bool,
    /// Cursor position as byte offset in buffer (0..=buffer.len())
    cursor: usize,
    /// First visible row when content exceeds MAX_VISIBLE_LINES
    scroll_offset: u16,
    /// Content width from last render (used for vertical movement)
    last_width: u16,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            locked: false,
            cursor: 0,
            scroll_offset: 0,
            last_width: 80,
        }
    }

    /// Required height for the current buffer, clamped to viewport limits.
    pub fn calculate_height(&self, area_width: u16) -> u16 {
        let rows = rows(&self.buffer, inner_width(area_width)).len() as u16;
        rows.clamp(1, MAX_VISIBLE_LINES) + VERTICAL_OVERHEAD
    }

    fn insert(&mut self, text: &str) {
        self.buffer.insert_str(self.cursor, text);
        self.cursor += text.len();
    }

    fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.scroll_offset = 0;
    }

    /// Row index and display column of the cursor.
    fn cursor_row_col(&self, width: u16) -> (usize, u16) {
        let rows = rows(&self.buffer, width);
        // The last row starting at or before the cursor. At a soft wrap this
        // puts the cursor at the head of the next row.
        let idx = rows
            .iter()
            .rposition(|row| row.start <= self.cursor)
            .unwrap_or(0);
        let row = rows[idx];
        let col = display_width(&self.buffer[row.start..self.cursor.min(row.end)]);
        (idx, col)
    }

    /// Move to the neighbouring row, keeping the display column where possible.
    fn move_vertically(&mut self, down: bool) -> bool {
        let width = inner_width(self.last_width);
        let rows = rows(&self.buffer, width);
        let (idx, col) = self.cursor_row_col(width);
        let target = if down {
            if idx + 1 >= rows.len() {
                return false;
            }
            idx + 1
        } else {
            let Some(prev) = idx.checked_sub(1) else {
                return false;
            };
            prev
        };

        let row = rows[target];
        let mut pos = row.start;
        let mut used = 0u16;
        for (i, c) in self.buffer[row.start..row.end].char_indices() {
            let w = c.width().unwrap_or(0) as u16;
            if used.saturating_add(w) > col {
                break;
            }
            used = used.saturating_add(w);
            pos = row.start + i + c.len_utf8();
        }
        self.cursor = pos;
        true
    }

    fn update_scroll_offset(&mut self, width: u16) {
        let (row, _) = self.cursor_row_col(width);
        let row = row as u16;
        if row < self.scroll_offset {
            self.scroll_offset = row;
        } else if row >= self.scroll_offset + MAX_VISIBLE_LINES {
            self.scroll_offset = row + 1 - MAX_VISIBLE_LINES;
        }
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.last_width = area.width;
        let width = inner_width(area.width);
        self.update_scroll_offset(width);

        let title = if self.locked { "Question (waiting for reply)" } else { "Question" };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title(title)
            .title_bottom(Line::from(KEY_HINTS).style(Style::default().fg(Color::DarkGray)))
            .padding(Padding::horizontal(1));

        let paragraph = if self.buffer.is_empty() {
            Paragraph::new(PLACEHOLDER).style(
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )
        } else {
            let lines: Vec<Line> = rows(&self.buffer, width)
                .into_iter()
                .skip(self.scroll_offset as usize)
                .take(MAX_VISIBLE_LINES as usize)
                .map(|row| Line::from(self.buffer[row.start..row.end].to_string()))
                .collect();
            Paragraph::new(lines).style(Style::default().fg(Color::Green))
        };
        frame.render_widget(paragraph.block(block), area);

        let (row, col) = self.cursor_row_col(width);
        let visible_row = (row as u16).saturating_sub(self.scroll_offset);
        let x = area.x + 2 + col.min(width.saturating_sub(1));
        let y = area.y + 1 + visible_row;
        frame.set_cursor_position((x, y));
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => {
                let mut tmp = [0u8; 4];
                self.insert(c.encode_utf8(&mut tmp));
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                self.insert(&text.replace("\r\n", "\n").replace('\r', "\n"));
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Backspace => {
                let prev = prev_char_boundary(&self.buffer, self.cursor)?;
                self.buffer.drain(prev..self.cursor);
                self.cursor = prev;
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Delete => {
                let next = next_char_boundary(&self.buffer, self.cursor)?;
                self.buffer.drain(self.cursor..next);
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::CursorLeft => {
                self.cursor = prev_char_boundary(&self.buffer, self.cursor)?;
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::CursorRight => {
                self.cursor = next_char_boundary(&self.buffer, self.cursor)?;
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::CursorHome => {
                let line_start = self.buffer[..self.cursor]
                    .rfind('\n')
                    .map(|i| i + 1)
                    .unwrap_or(0);
                (self.cursor != line_start).then(|| {
                    self.cursor = line_start;
                    InputEvent::ContentChanged
                })
            }
            TuiEvent::CursorEnd => {
                let line_end = self.buffer[self.cursor..]
                    .find('\n')
                    .map(|i| self.cursor + i)
                    .unwrap_or(self.buffer.len());
                (self.cursor != line_end).then(|| {
                    self.cursor = line_end;
                    InputEvent::ContentChanged
                })
            }
            TuiEvent::CursorUp => self.move_vertically(false).then_some(InputEvent::ContentChanged),
            TuiEvent::CursorDown => self.move_vertically(true).then_some(InputEvent::ContentChanged),
            TuiEvent::Submit => {
                if self.locked || self.buffer.trim().is_empty() {
                    return None;
                }
                let text = self.buffer.clone();
                self.clear();
                Some(InputEvent::Submit(text))
            }
            _ => None,
        }
    }
}

/// Content width after subtracting border/padding overhead.
fn inner_width(area_width: u16) -> u16 {
    area_width.saturating_sub(HORIZONTAL_OVERHEAD)
}

fn display_width(s: &str) -> u16 {
    let total: usize = s.chars().map(|c| c.width().unwrap_or(0)).sum();
    u16::try_from(total).unwrap_or(u16::MAX)
}

/// Splits `text` into visual rows of at most `width` columns.
///
/// Always returns at least one row. A trailing newline yields an empty last row.
fn rows(text: &str, width: u16) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut start = 0;
    let mut used = 0u16;
    for (i, c) in text.char_indices() {
        if c == '\n' {
            rows.push(Row { start, end: i });
            start = i + 1;
            used = 0;
            continue;
        }
        let w = c.width().unwrap_or(0) as u16;
        if width > 0 && used > 0 && used.saturating_add(w) > width {
            rows.push(Row { start, end: i });
            start = i;
            used = 0;
        }
        used = used.saturating_add(w);
    }
    rows.push(Row {
        start,
        end: text.len(),
    });
    rows
}

fn prev_char_boundary(text: &str, pos: usize) -> Option<usize> {
    text[..pos].char_indices().next_back().map(|(i, _)| i)
}

fn next_char_boundary(text: &str, pos: usize) -> Option<usize> {
    text[pos..].chars().next().map(|c| pos + c.len_utf8())
}
