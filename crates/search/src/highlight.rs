//! Match highlighting and compact excerpts
//!
//! This module provides:
//! - HighlightConfig: markers, ellipsis and window radius
//! - Highlighter: wraps term occurrences in markers outside markup tags,
//!   and cuts compact excerpts around matches
//! - strip_tags: markup to plain text for compact rendering
//!
//! Matching is case-insensitive and Unicode-aware. Longer terms are tried
//! first, so a phrase wins over a word it contains.

use crate::config::SearchConfig;
use once_cell::sync::Lazy;
use regex::Regex;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
// Tags and character entities pass through highlighting untouched
static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>|&[#\w]+;").unwrap());
static BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());

/// Remove markup tags, turning line breaks into spaces
pub fn strip_tags(html: &str) -> String {
    let spaced = BREAK.replace_all(html, " ");
    TAG.replace_all(&spaced, "").into_owned()
}

/// Highlighting configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightConfig {
    /// Markup opening a match
    pub open: String,
    /// Markup closing a match
    pub close: String,
    /// Separator between non-adjacent excerpts
    pub ellipsis: String,
    /// Characters kept on each side of a match
    pub radius: usize,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for HighlightConfig {
    fn from(config: &SearchConfig) -> Self {
        HighlightConfig {
            open: config.highlight_open.clone(),
            close: config.highlight_close.clone(),
            ellipsis: config.ellipsis.clone(),
            radius: config.compact_radius,
        }
    }
}

/// Highlights matches and builds compact excerpts
#[derive(Debug, Clone, Default)]
pub struct Highlighter {
    config: HighlightConfig,
}

impl Highlighter {
    /// Create a highlighter
    pub fn new(config: HighlightConfig) -> Self {
        Highlighter { config }
    }

    /// Configuration in use
    pub fn config(&self) -> &HighlightConfig {
        &self.config
    }

    /// Case-insensitive alternation of `terms`, longest first
    ///
    /// Whitespace inside a phrase matches any run of whitespace. `None` when
    /// there is nothing to match.
    pub fn pattern(terms: &[&str]) -> Option<Regex> {
        let mut parts: Vec<String> = terms
            .iter()
            .map(|t| t.split_whitespace().map(regex::escape).collect::<Vec<_>>().join(r"\s+"))
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            return None;
        }
        parts.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        parts.dedup();
        Regex::new(&format!("(?i)(?:{})", parts.join("|"))).ok()
    }

    /// Wrap every occurrence of `terms` in the markers
    ///
    /// Text inside `<...>` tags and character entities is left untouched.
    pub fn highlight(&self, html: &str, terms: &[&str]) -> String {
        let Some(pattern) = Self::pattern(terms) else {
            return html.to_string();
        };
        let mut out = String::with_capacity(html.len() + 32);
        let mut last = 0;
        for tag in MARKUP.find_iter(html) {
            self.highlight_text(&html[last..tag.start()], &pattern, &mut out);
            out.push_str(tag.as_str());
            last = tag.end();
        }
        self.highlight_text(&html[last..], &pattern, &mut out);
        out
    }

    fn highlight_text(&self, text: &str, pattern: &Regex, out: &mut String) {
        let mut last = 0;
        for m in pattern.find_iter(text) {
            out.push_str(&text[last..m.start()]);
            out.push_str(&self.config.open);
            out.push_str(m.as_str());
            out.push_str(&self.config.close);
            last = m.end();
        }
        out.push_str(&text[last..]);
    }

    /// Excerpts of plain `text` around each occurrence of `terms`
    ///
    /// Each match keeps `radius` characters on both sides; overlapping
    /// windows merge and separate windows are joined by the ellipsis. Text no
    /// longer than the radius is returned whole. Without any occurrence the
    /// leading `2 * radius` characters are kept.
    pub fn compact(&self, text: &str, terms: &[&str]) -> String {
        let radius = self.config.radius;
        let char_len = text.chars().count();
        if char_len <= radius {
            return text.to_string();
        }

        // Byte offset of every char, plus the end
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_at = |byte: usize| offsets.partition_point(|&o| o < byte);

        let mut windows: Vec<(usize, usize)> = Vec::new();
        if let Some(pattern) = Self::pattern(terms) {
            for m in pattern.find_iter(text) {
                let start = char_at(m.start()).saturating_sub(radius);
                let end = (char_at(m.end()) + radius).min(char_len);
                match windows.last_mut() {
                    Some(prev) if start <= prev.1 => prev.1 = prev.1.max(end),
                    _ => windows.push((start, end)),
                }
            }
        }
        if windows.is_empty() {
            windows.push((0, (2 * radius).min(char_len)));
        }

        windows
            .iter()
            .map(|&(start, end)| text[offsets[start]..offsets[end]].trim())
            .collect::<Vec<_>>()
            .join(&self.config.ellipsis)
    }
}
