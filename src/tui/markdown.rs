//! Markdown → ratatui `Text` renderer.
//!
//! Thin wrapper around `pulldown_cmark` that converts markdown events into
//! styled `Line`/`Span` values. Headings, bold, italic, inline code, fenced
//! code blocks, lists, blockquotes, and links.
//!
//! Replies are plain text by the time they get here, so soft breaks are kept
//! as line breaks rather than folded into spaces.
//!
//! With [`Markup::Allowed`] a small set of inline tags is honored:
//! `<strong>` and `<span class='badge' | 'tip' | 'warning'>`. Any other tag
//! is dropped. With [`Markup::Escaped`] tags are shown as literal text.

use pulldown_cmark::{CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

/// Whether inline tags are interpreted or shown verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    Allowed,
    Escaped,
}

/// Parse markdown content into styled `Text` using Heel's color scheme.
///
/// Returns owned text (`'static`) so callers aren't constrained by input lifetime.
pub fn render(content: &str, base_fg: Color, markup: Markup) -> Text<'static> {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TASKLISTS);

    let mut w = Writer::new(base_fg, markup);
    for event in Parser::new_ext(content, opts) {
        w.handle(event);
    }
    w.text
}

// ── Inline tags ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InlineTag {
    Strong,
    Badge,
    Tip,
    Warning,
    /// A `<span>` with an unknown class. Still needs a matching pop.
    Span,
}

impl InlineTag {
    fn style(self) -> Style {
        match self {
            InlineTag::Strong => Style::default().add_modifier(Modifier::BOLD),
            InlineTag::Badge => Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            InlineTag::Tip => Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            InlineTag::Warning => Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
            InlineTag::Span => Style::default(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum HtmlPiece<'a> {
    Open(InlineTag),
    Close,
    /// A tag outside the supported set.
    Other,
    Text(&'a str),
}

/// Splits raw HTML into tags and the text between them.
fn html_pieces(raw: &str) -> Vec<HtmlPiece<'_>> {
    let mut pieces = Vec::new();
    let mut rest = raw;
    while !rest.is_empty() {
        let Some(start) = rest.find('<') else {
            pieces.push(HtmlPiece::Text(rest));
            break;
        };
        if start > 0 {
            pieces.push(HtmlPiece::Text(&rest[..start]));
        }
        let Some(len) = rest[start..].find('>') else {
            pieces.push(HtmlPiece::Text(&rest[start..]));
            break;
        };
        pieces.push(classify_tag(&rest[start + 1..start + len]));
        rest = &rest[start + len + 1..];
    }
    pieces
}

fn classify_tag(inner: &str) -> HtmlPiece<'static> {
    let inner = inner.trim();
    if let Some(name) = inner.strip_prefix('/') {
        return match name.trim() {
            "strong" | "span" => HtmlPiece::Close,
            _ => HtmlPiece::Other,
        };
    }
    let (name, attrs) = inner.split_once(char::is_whitespace).unwrap_or((inner, ""));
    match name {
        "strong" => HtmlPiece::Open(InlineTag::Strong),
        "span" => {
            let class = attrs
                .trim()
                .strip_prefix("class=")
                .map(|v| v.trim_matches(|c| c == '\'' || c == '"'))
                .unwrap_or("");
            HtmlPiece::Open(match class {
                "badge" => InlineTag::Badge,
                "tip" => InlineTag::Tip,
                "warning" => InlineTag::Warning,
                _ => InlineTag::Span,
            })
        }
        _ => HtmlPiece::Other,
    }
}

// ── Writer ──────────────────────────────────────────────────────────────────

struct Writer {
    text: Text<'static>,
    base_fg: Color,
    markup: Markup,
    /// Inline style stack (bold, italic, heading text, inline tags, etc.).
    /// Styles compose via `patch` so nested bold+italic works.
    styles: Vec<Style>,
    /// Overlays from open inline tags. Kept apart from `styles` so a stray
    /// close tag can't pop a markdown style, and cleared at block end.
    tag_styles: Vec<Style>,
    /// Per-line prefix spans (blockquote `│`, code block `│`).
    line_prefixes: Vec<Span<'static>>,
    /// List nesting: None = unordered, Some(n) = ordered at index n.
    list_indices: Vec<Option<u64>>,
    /// True when inside a fenced or indented code block.
    in_code: bool,
    /// Stored link URL, appended after the link text closes.
    link_url: Option<String>,
    /// Whether the next block element should be preceded by a blank line.
    needs_newline: bool,
}

impl Writer {
    fn new(base_fg: Color, markup: Markup) -> Self {
        Self {
            text: Text::default(),
            base_fg,
            markup,
            styles: vec![],
            tag_styles: vec![],
            line_prefixes: vec![],
            list_indices: vec![],
            in_code: false,
            link_url: None,
            needs_newline: false,
        }
    }

    // ── Style helpers ───────────────────────────────────────────────────

    /// Markdown style: top of stack, or base foreground color.
    fn block_style(&self) -> Style {
        self.styles
            .last()
            .copied()
            .unwrap_or_else(|| Style::default().fg(self.base_fg))
    }

    /// Current effective style: markdown style with open tag overlays on top.
    fn style(&self) -> Style {
        self.tag_styles
            .iter()
            .fold(self.block_style(), |style, overlay| style.patch(*overlay))
    }

    /// Push a style that composes with the current one (inherits parent modifiers).
    fn push_style(&mut self, overlay: Style) {
        self.styles.push(self.block_style().patch(overlay));
    }

    fn pop_style(&mut self) {
        self.styles.pop();
    }

    // ── Line/span helpers ───────────────────────────────────────────────

    fn push_line(&mut self, line: Line<'static>) {
        let mut out = line;
        for pfx in self.line_prefixes.iter().rev().cloned() {
            out.spans.insert(0, pfx);
        }
        self.text.lines.push(out);
    }

    fn push_span(&mut self, span: Span<'static>) {
        if let Some(line) = self.text.lines.last_mut() {
            line.push_span(span);
        } else {
            self.push_line(Line::from(vec![span]));
        }
    }

    fn blank_line_if_needed(&mut self) {
        if self.needs_newline {
            self.push_line(Line::default());
            self.needs_newline = false;
        }
    }

    // ── Event dispatch ──────────────────────────────────────────────────

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(tag) => self.close(tag),
            Event::Text(t) => self.text(t),
            Event::Code(c) => self.inline_code(c),
            Event::Html(h) | Event::InlineHtml(h) => self.html(&h),
            Event::SoftBreak | Event::HardBreak => self.push_line(Line::default()),
            Event::Rule => {
                self.blank_line_if_needed();
                self.push_line(Line::from(Span::styled(
                    "─".repeat(40),
                    Style::default().fg(Color::DarkGray),
                )));
                self.needs_newline = true;
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.push_span(Span::raw(marker));
            }
            _ => {} // Footnotes, math: skip
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        match tag {
            // ── Block elements ──────────────────────────────────────────
            Tag::Paragraph => {
                self.blank_line_if_needed();
                self.push_line(Line::default());
            }
            Tag::HtmlBlock => {
                self.blank_line_if_needed();
                self.push_line(Line::default());
            }
            Tag::Heading { level, .. } => {
                self.blank_line_if_needed();
                let hs = heading_style(self.base_fg, level);
                self.push_line(Line::default());
                self.push_style(hs);
            }
            Tag::BlockQuote(_) => {
                self.blank_line_if_needed();
                self.line_prefixes.push(Span::styled(
                    "│ ",
                    Style::default().fg(Color::DarkGray),
                ));
                self.push_style(
                    Style::default()
                        .fg(self.base_fg)
                        .add_modifier(Modifier::DIM | Modifier::ITALIC),
                );
            }
            Tag::CodeBlock(kind) => {
                if !self.text.lines.is_empty() {
                    self.push_line(Line::default());
                }
                let lang = match &kind {
                    CodeBlockKind::Fenced(l) => l.as_ref(),
                    CodeBlockKind::Indented => "",
                };

                // Top border: ╭── lang  or just ╭──
                let bs = Style::default().fg(Color::DarkGray);
                let top = if lang.is_empty() {
                    Line::from(Span::styled("╭──", bs))
                } else {
                    Line::from(vec![
                        Span::styled("╭── ", bs),
                        Span::styled(lang.to_owned(), bs.add_modifier(Modifier::BOLD)),
                        Span::styled(" ──", bs),
                    ])
                };
                self.push_line(top);
                self.line_prefixes.push(Span::styled("│ ", bs));
                self.in_code = true;
            }
            Tag::List(start) => {
                if self.list_indices.is_empty() {
                    self.blank_line_if_needed();
                }
                self.list_indices.push(start);
            }
            Tag::Item => {
                self.push_line(Line::default());
                let depth = self.list_indices.len().saturating_sub(1);
                let indent = "  ".repeat(depth);
                if let Some(idx) = self.list_indices.last_mut() {
                    let marker = match idx {
                        None => format!("{indent}- "),
                        Some(n) => {
                            let s = format!("{indent}{n}. ");
                            *n += 1;
                            s
                        }
                    };
                    self.push_span(Span::styled(marker, Style::default().fg(Color::DarkGray)));
                }
            }

            // ── Inline elements ─────────────────────────────────────────
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.link_url = Some(dest_url.to_string());
                self.push_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::UNDERLINED),
                );
            }
            _ => {} // Tables, images, definitions: skip
        }
    }

    fn close(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::HtmlBlock => {
                self.tag_styles.clear();
                self.needs_newline = true;
            }
            TagEnd::Item => self.tag_styles.clear(),
            TagEnd::Heading(_) => {
                self.tag_styles.clear();
                self.pop_style();
                self.needs_newline = true;
            }
            TagEnd::BlockQuote(_) => {
                self.line_prefixes.pop();
                self.pop_style();
                self.needs_newline = true;
            }
            TagEnd::CodeBlock => {
                self.in_code = false;
                self.line_prefixes.pop(); // remove │ prefix before bottom border
                let bs = Style::default().fg(Color::DarkGray);
                self.push_line(Line::from(Span::styled("╰──", bs)));
                self.needs_newline = true;
            }
            TagEnd::List(_) => {
                self.list_indices.pop();
                self.needs_newline = true;
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style();
                if let Some(url) = self.link_url.take() {
                    self.push_span(Span::raw(" ("));
                    self.push_span(Span::styled(
                        url,
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::UNDERLINED),
                    ));
                    self.push_span(Span::raw(")"));
                }
            }
            _ => {}
        }
    }

    // ── Content handlers ────────────────────────────────────────────────

    fn text(&mut self, cow: CowStr<'_>) {
        // Expand tabs → 4 spaces (ratatui renders \t as zero-width)
        let text = cow.replace('\t', "    ");

        if self.in_code {
            let code_style = Style::default().fg(Color::White);
            for line in text.lines() {
                self.push_line(Line::from(Span::styled(line.to_owned(), code_style)));
            }
            return;
        }

        // Normal text inherits current style (heading, bold, tag, etc.)
        let style = self.style();
        self.push_span(Span::styled(text, style));
    }

    fn inline_code(&mut self, cow: CowStr<'_>) {
        let style = Style::default().fg(Color::White).bg(Color::DarkGray);
        self.push_span(Span::styled(cow.to_string(), style));
    }

    fn html(&mut self, raw: &str) {
        if self.markup == Markup::Escaped {
            let style = self.style();
            self.push_html_text(raw, style);
            return;
        }
        for piece in html_pieces(raw) {
            match piece {
                HtmlPiece::Open(tag) => self.tag_styles.push(tag.style()),
                HtmlPiece::Close => {
                    self.tag_styles.pop();
                }
                HtmlPiece::Other => {}
                HtmlPiece::Text(t) => {
                    let style = self.style();
                    self.push_html_text(t, style);
                }
            }
        }
    }

    /// HTML blocks keep their own line breaks.
    fn push_html_text(&mut self, raw: &str, style: Style) {
        let mut lines = raw.split('\n');
        if let Some(first) = lines.next()
            && !first.is_empty()
        {
            self.push_span(Span::styled(first.to_owned(), style));
        }
        for line in lines {
            self.push_line(Line::default());
            if !line.is_empty() {
                self.push_span(Span::styled(line.to_owned(), style));
            }
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn heading_style(base_fg: Color, level: HeadingLevel) -> Style {
    match level {
        HeadingLevel::H1 => Style::default()
            .fg(base_fg)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        HeadingLevel::H2 => Style::default().fg(base_fg).add_modifier(Modifier::BOLD),
        _ => Style::default()
            .fg(base_fg)
            .add_modifier(Modifier::BOLD | Modifier::ITALIC),
    }
}
