//! # Response Rendering
//!
//! Turns a raw model reply into what the user sees, in three stages:
//!
//! ```text
//! raw ──clean()──▶ cleaned ──tokens()──▶ Word / LineBreak ──▶ plain text
//!                                                              │
//!                                          decorate() ◀────────┘ (once, at the end)
//! ```
//!
//! The plain text is what goes into the conversation. The decorated text
//! carries a handful of inline tags and is only ever used for display.

use std::time::Duration;

/// Ordered `(pattern, replacement)` pairs stripped from every reply.
///
/// The fourth row turns the two-character sequence `\n` (a backslash and an
/// `n`) into a real line break.
pub const FORMATTING_CLEANERS: &[(&str, &str)] = &[
    ("```", ""),
    ("**", ""),
    ("###", ""),
    ("\\n", "\n"),
    ("\"", "'"),
    ("{", ""),
    ("}", ""),
];

/// Ordered `(pattern, replacement)` pairs applied to a finished reply for display.
pub const DECORATIONS: &[(&str, &str)] = &[
    ("Step", "<strong>Step</strong>"),
    ("Goal:", "<strong>🌟 Goal:</strong>"),
    ("💡 Pro Tip:", "<span class='tip'>💡 Pro Tip:</span>"),
    (
        "⚠️ Safety Notice:",
        "<span class='warning'>⚠️ Safety Notice:</span>",
    ),
];

/// Marker appended to text that is still being typed out.
pub const CURSOR: &str = "▌";

/// Delay after each emitted word.
pub const WORD_PACE: Duration = Duration::from_millis(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    LineBreak,
}

impl Token {
    /// Appends this token the way the typewriter assembles text.
    pub fn push_to(&self, out: &mut String) {
        match self {
            Token::Word(word) => {
                out.push_str(word);
                out.push(' ');
            }
            Token::LineBreak => out.push('\n'),
        }
    }
}

/// Applies [`FORMATTING_CLEANERS`] in order.
///
/// The table is re-run until nothing changes, so removing one marker can
/// never leave another behind (`*###*` would otherwise become `**`).
pub fn clean(raw: &str) -> String {
    let mut text = raw.to_string();
    loop {
        let next = FORMATTING_CLEANERS
            .iter()
            .fold(text.clone(), |acc, (pattern, replacement)| {
                acc.replace(pattern, replacement)
            });
        if next == text {
            return text;
        }
        text = next;
    }
}

/// Splits cleaned text into words, with a `LineBreak` after every line.
pub fn tokens(cleaned: &str) -> Vec<Token> {
    cleaned
        .split('\n')
        .flat_map(|line| {
            line.split_whitespace()
                .map(|word| Token::Word(word.to_string()))
                .chain(std::iter::once(Token::LineBreak))
        })
        .collect()
}

/// Cleans and assembles a reply in one go, exactly as the typewriter would.
pub fn render(raw: &str) -> String {
    let mut out = String::new();
    for token in tokens(&clean(raw)) {
        token.push_to(&mut out);
    }
    out
}

/// Emits the reply one token at a time, pausing `pace` after each word.
///
/// Returns the assembled plain text, identical to [`render`].
pub async fn render_streaming<F>(raw: &str, pace: Duration, mut emit: F) -> String
where
    F: FnMut(&Token),
{
    let mut out = String::new();
    for token in tokens(&clean(raw)) {
        token.push_to(&mut out);
        emit(&token);
        if matches!(token, Token::Word(_)) && !pace.is_zero() {
            tokio::time::sleep(pace).await;
        }
    }
    out
}

/// Text shown while a reply is still being typed out.
pub fn in_progress(partial: &str) -> String {
    format!("{partial}{CURSOR}")
}

/// Applies [`DECORATIONS`] in order, once each.
pub fn decorate(text: &str) -> String {
    DECORATIONS
        .iter()
        .fold(text.to_string(), |acc, (pattern, replacement)| {
            acc.replace(pattern, replacement)
        })
}
