//! Canonical search terms extracted from a query
//!
//! A [`TokenSet`] is produced once per request by the tokenizer and consumed
//! read-only by backends and the highlighter.

use serde::{Deserialize, Serialize};

/// A single search term: one word, or a quoted phrase of several words
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    /// Single word
    Word(String),
    /// Quoted phrase, matched as a whole
    Phrase(String),
}

impl Term {
    /// Text of the term (lowercased, entity-decoded)
    pub fn text(&self) -> &str {
        match self {
            Term::Word(w) => w,
            Term::Phrase(p) => p,
        }
    }

    /// True for quoted phrases
    pub fn is_phrase(&self) -> bool {
        matches!(self, Term::Phrase(_))
    }
}

/// Required, excluded and ignored terms of one query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Words every match must contain
    pub required_words: Vec<String>,
    /// Phrases every match must contain
    pub required_phrases: Vec<String>,
    /// Words no match may contain
    pub excluded_words: Vec<String>,
    /// Phrases no match may contain
    pub excluded_phrases: Vec<String>,
    /// Terms dropped by the stop-word list or length filter
    pub ignored: Vec<String>,
    /// Match subjects only
    pub subject_only: bool,
}

impl TokenSet {
    /// Create an empty token set
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct required terms (words plus phrases)
    pub fn required_len(&self) -> usize {
        self.required_words.len() + self.required_phrases.len()
    }

    /// True when there is nothing to match
    pub fn is_empty(&self) -> bool {
        self.required_len() == 0
    }

    /// All required terms, words first
    pub fn required_terms(&self) -> impl Iterator<Item = Term> + '_ {
        self.required_words
            .iter()
            .cloned()
            .map(Term::Word)
            .chain(self.required_phrases.iter().cloned().map(Term::Phrase))
    }

    /// All excluded terms, words first
    pub fn excluded_terms(&self) -> impl Iterator<Item = Term> + '_ {
        self.excluded_words
            .iter()
            .cloned()
            .map(Term::Word)
            .chain(self.excluded_phrases.iter().cloned().map(Term::Phrase))
    }

    /// Text of every required term, words first
    ///
    /// Used by the highlighter to build its pattern.
    pub fn highlight_terms(&self) -> Vec<&str> {
        self.required_words
            .iter()
            .chain(self.required_phrases.iter())
            .map(String::as_str)
            .collect()
    }

    /// True when the query is made of phrases only
    pub fn is_phrase_only(&self) -> bool {
        self.required_words.is_empty() && !self.required_phrases.is_empty()
    }
}
