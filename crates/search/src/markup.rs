//! Simple censor and markup renderer
//!
//! This module provides:
//! - WordCensor: replaces configured words with asterisks
//! - BbcRenderer: escapes HTML and renders a small bulletin-board tag subset
//!
//! Forums with their own censor or renderer plug those in through
//! [`Censor`] and [`MarkupRenderer`] instead.

use crate::collaborators::{Censor, MarkupRenderer};
use once_cell::sync::Lazy;
use regex::Regex;

// ============================================================================
// WordCensor
// ============================================================================

/// Replaces whole censored words, case-insensitively, with asterisks
#[derive(Debug, Default)]
pub struct WordCensor {
    pattern: Option<Regex>,
}

impl WordCensor {
    /// Censor for the given word list
    pub fn new<S: AsRef<str>>(words: &[S]) -> Self {
        let alternation: Vec<String> = words
            .iter()
            .map(|w| w.as_ref().trim())
            .filter(|w| !w.is_empty())
            .map(regex::escape)
            .collect();
        if alternation.is_empty() {
            return WordCensor { pattern: None };
        }
        let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", alternation.join("|"))).ok();
        WordCensor { pattern }
    }
}

impl Censor for WordCensor {
    fn censor(&self, text: &str) -> String {
        match &self.pattern {
            Some(re) => re
                .replace_all(text, |caps: &regex::Captures<'_>| {
                    "*".repeat(caps[0].chars().count())
                })
                .into_owned(),
            None => text.to_string(),
        }
    }
}

// ============================================================================
// BbcRenderer
// ============================================================================

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)\[b\](.*?)\[/b\]").unwrap());
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)\[i\](.*?)\[/i\]").unwrap());
static URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\[url=(https?://[^\]\s]+)\](.*?)\[/url\]").unwrap());
static QUOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\[quote\](.*?)\[/quote\]").unwrap());
static SMILEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(^|\s)(:\)|:\(|;\))").unwrap());

/// Escape the HTML metacharacters of plain text
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders `[b]`, `[i]`, `[url=..]` and `[quote]` tags plus line breaks
#[derive(Debug, Default, Clone, Copy)]
pub struct BbcRenderer;

impl MarkupRenderer for BbcRenderer {
    fn render(&self, body: &str, smileys: bool) -> String {
        let html = escape_html(body);
        let html = BOLD.replace_all(&html, "<b>$1</b>");
        let html = ITALIC.replace_all(&html, "<i>$1</i>");
        let html = URL.replace_all(&html, "<a href=\"$1\">$2</a>");
        let html = QUOTE.replace_all(&html, "<blockquote>$1</blockquote>");
        let html = if smileys {
            SMILEY.replace_all(&html, "$1<span class=\"smiley\">$2</span>")
        } else {
            html
        };
        html.replace("\r\n", "\n").replace('\n', "<br />")
    }
}
