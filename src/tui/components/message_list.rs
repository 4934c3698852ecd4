//! # MessageList Component
//!
//! Scrollable view of the conversation.
//!
//! ## Responsibilities
//!
//! - Display every stored message, plus the reply being typed out
//! - Pick the right body for each message (decorated, badge markup, plain)
//! - Keep the view pinned to the bottom until the user scrolls away
//!
//! ## Architecture
//!
//! `MessageList` is a transient component (created each frame) that wraps
//! `&'a mut MessageListState` (persistent state) and `&'a App` (props).
//! Stored messages are parsed once and cached with their last measured
//! height; only the reply being typed is rebuilt each frame. Only the
//! visible slice is drawn.

use std::ops::Range;

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::state::App;
use crate::inference::Role;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::{Body, Message};
use crate::tui::event::TuiEvent;

/// Layout and scroll state for the message list.
/// Must be persisted in the parent TuiState.
pub struct MessageListState {
    /// Scroll offset and view state
    pub scroll_state: ScrollViewState,
    /// Measurements from the last frame
    pub layout: LayoutCache,
    /// Rendered stored messages, by conversation index
    pub messages: MessageCache,
    /// When true, auto-scroll to bottom on new content
    pub stick_to_bottom: bool,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::default(),
            messages: MessageCache::default(),
            stick_to_bottom: true, // Start attached to bottom
            viewport_height: 0,
        }
    }

    fn max_offset(&self) -> u16 {
        self.layout.total_height().saturating_sub(self.viewport_height)
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Clamp scroll and re-engage auto-scroll if the user has reached the bottom.
    /// Called on scroll-down events so that scrolling past the end re-pins to bottom.
    pub fn repin_if_at_bottom(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Back to the top-level pinned view, e.g. after the history is cleared.
    pub fn reset(&mut self) {
        self.scroll_state = ScrollViewState::default();
        self.layout = LayoutCache::default();
        self.messages = MessageCache::default();
        self.stick_to_bottom = true;
    }
}

/// Picks how stored message `index` is displayed: decorated, badge markup, or plain.
fn body_for<'a>(app: &'a App, index: usize, msg: &'a crate::inference::Message) -> Body<'a> {
    match app.decorated.get(&index) {
        Some(decorated) => Body::Markup(decorated),
        None if msg.has_badges() => Body::Markup(&msg.content),
        None => Body::Markdown(&msg.content),
    }
}

struct CachedMessage {
    role: Role,
    markup: bool,
    source: String,
    message: Message,
    /// `(width, height)` from the last measurement.
    measured: Option<(u16, u16)>,
}

impl CachedMessage {
    fn new(role: Role, body: Body<'_>) -> Self {
        let (markup, source) = match body {
            Body::Markup(s) => (true, s),
            Body::Markdown(s) | Body::Typing(s) => (false, s),
        };
        Self {
            role,
            markup,
            source: source.to_string(),
            message: Message::new(role, body),
            measured: None,
        }
    }

    fn matches(&self, role: Role, body: Body<'_>) -> bool {
        let (markup, source) = match body {
            Body::Markup(s) => (true, s),
            Body::Markdown(s) | Body::Typing(s) => (false, s),
        };
        self.role == role && self.markup == markup && self.source == source
    }

    fn height(&mut self, width: u16) -> u16 {
        match self.measured {
            Some((w, h)) if w == width => h,
            _ => {
                let h = self.message.height(width);
                self.measured = Some((width, h));
                h
            }
        }
    }
}

/// Stored messages, parsed once and re-measured only when the width changes.
#[derive(Default)]
pub struct MessageCache {
    entries: Vec<CachedMessage>,
}

impl MessageCache {
    /// Brings the cache in line with the conversation. Returns how many
    /// entries had to be rebuilt.
    pub fn sync(&mut self, app: &App) -> usize {
        let stored = app.conversation.messages();
        self.entries.truncate(stored.len());
        let mut rebuilt = 0;
        for (i, msg) in stored.iter().enumerate() {
            let body = body_for(app, i, msg);
            match self.entries.get_mut(i) {
                Some(entry) if entry.matches(msg.role, body) => {}
                Some(entry) => {
                    *entry = CachedMessage::new(msg.role, body);
                    rebuilt += 1;
                }
                None => {
                    self.entries.push(CachedMessage::new(msg.role, body));
                    rebuilt += 1;
                }
            }
        }
        rebuilt
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Message> {
        self.entries.get(i).map(|e| &e.message)
    }

    /// Heights at `width`, measuring only entries not yet seen at that width.
    pub fn heights(&mut self, width: u16) -> Vec<u16> {
        self.entries.iter_mut().map(|e| e.height(width)).collect()
    }
}

/// Scrollable conversation view component.
/// Created fresh each frame with references to state and data.
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub app: &'a App,
}

impl<'a> MessageList<'a> {
    pub fn new(state: &'a mut MessageListState, app: &'a App) -> Self {
        Self { state, app }
    }
}

impl<'a> Component for MessageList<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // -1 for scrollbar safe area
        self.state.messages.sync(self.app);
        let typing = self
            .app
            .streaming
            .as_deref()
            .map(|partial| Message::new(Role::Assistant, Body::Typing(partial)));

        // 1. Measure
        let mut heights = self.state.messages.heights(content_width);
        if let Some(message) = &typing {
            heights.push(message.height(content_width));
        }
        self.state.layout.rebuild(heights);
        let total_height = self.state.layout.total_height();

        // 2. Clamp scroll offset to prevent overscrolling past content.
        self.state.viewport_height = area.height;
        if !self.state.stick_to_bottom {
            self.state.clamp_scroll();
        }

        let scroll_offset = self.state.scroll_state.offset().y;
        let visible_range = self.state.layout.visible_range(scroll_offset, area.height);

        // 3. Render visible messages into a ScrollView
        let mut scroll_view = ScrollView::new(Size::new(content_width, total_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        for i in visible_range {
            let message = match self.state.messages.get(i) {
                Some(message) => message,
                None => match &typing {
                    Some(message) => message,
                    None => continue,
                },
            };
            let top = self.state.layout.top_of(i);
            let rect = Rect::new(0, top, content_width, self.state.layout.heights[i]);
            scroll_view.render_widget(message, rect);
        }

        if self.state.stick_to_bottom {
            self.state.scroll_state.scroll_to_bottom();
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

/// EventHandler is implemented on `MessageListState` rather than `MessageList`
/// because the scroll position must outlive the per-frame component.
impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            _ => {}
        }
        None
    }
}

/// Per-message heights from the last frame.
#[derive(Debug, Default)]
pub struct LayoutCache {
    pub heights: Vec<u16>,
    /// Running totals: `prefix_heights[i]` is the bottom edge of message `i`.
    pub prefix_heights: Vec<u16>,
}

impl LayoutCache {
    pub fn rebuild(&mut self, heights: impl IntoIterator<Item = u16>) {
        self.heights = heights.into_iter().collect();
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u16, |acc, &h| {
                *acc = acc.saturating_add(h);
                Some(*acc)
            })
            .collect();
    }

    pub fn total_height(&self) -> u16 {
        self.prefix_heights.last().copied().unwrap_or(0)
    }

    /// Top edge of message `i`.
    pub fn top_of(&self, i: usize) -> u16 {
        if i == 0 { 0 } else { self.prefix_heights[i - 1] }
    }

    /// Messages overlapping the viewport, padded by half a screen each way.
    pub fn visible_range(&self, scroll_offset: u16, viewport_height: u16) -> Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end
    }
}
