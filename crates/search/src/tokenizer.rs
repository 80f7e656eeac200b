//! Query tokenizer
//!
//! Pipeline: length check → HTML entity decode → lowercase → punctuation to
//! spaces → balance quotes → extract phrases → split words → negation →
//! stop-word / length filter → dedup → term cap.
//!
//! Phrases are pulled out of the text before word splitting, so the words of
//! `"release notes"` never show up as separate required words.

use crate::config::SearchConfig;
use boardsearch_core::{Result, SearchError, TokenSet};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]{1,6}|#[0-9]{1,7}|[a-zA-Z]{2,8});").unwrap());

/// Characters with no meaning in a query
fn is_noise(c: char) -> bool {
    matches!(
        c,
        '(' | ')'
            | '{'
            | '}'
            | '['
            | ']'
            | '<'
            | '>'
            | '!'
            | '@'
            | '$'
            | '%'
            | '^'
            | '*'
            | '.'
            | ','
            | ':'
            | ';'
            | '+'
            | '='
            | '`'
            | '~'
            | '?'
            | '/'
            | '\\'
            | '\u{A0}'
    ) || c.is_control()
}

/// Decode the HTML entities a browser may have submitted
///
/// Unknown named entities are left as they are.
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures<'_>| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match body.to_ascii_lowercase().as_str() {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                }
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Turns raw query strings into [`TokenSet`]s
#[derive(Debug, Clone)]
pub struct Tokenizer {
    stopwords: HashSet<String>,
    min_word_length: usize,
    max_terms: usize,
    max_query_length: usize,
}

impl Tokenizer {
    /// Build a tokenizer from configuration
    pub fn new(config: &SearchConfig) -> Self {
        Tokenizer {
            stopwords: config.stopwords.iter().map(|w| w.to_lowercase()).collect(),
            min_word_length: config.min_word_length,
            max_terms: config.max_terms,
            max_query_length: config.max_query_length,
        }
    }

    /// Check if a term is on the stop-word list.
    #[inline]
    pub fn is_stopword(&self, term: &str) -> bool {
        self.stopwords.contains(term)
    }

    /// Tokenize a raw query
    ///
    /// # Errors
    ///
    /// - `QueryTooLong` before any processing when the query exceeds the limit
    /// - `EmptyQuery` for blank input
    /// - `AllTermsIgnored` when terms existed but all were filtered
    /// - `InvalidSearchString` when no searchable term could be found at all
    ///
    /// # Example
    ///
    /// ```
    /// use boardsearch_search::{SearchConfig, Tokenizer};
    ///
    /// let tokenizer = Tokenizer::new(&SearchConfig::default());
    /// let tokens = tokenizer.tokenize("elk -forum \"release notes\"", false).unwrap();
    /// assert_eq!(tokens.required_words, vec!["elk"]);
    /// assert_eq!(tokens.required_phrases, vec!["release notes"]);
    /// assert_eq!(tokens.excluded_words, vec!["forum"]);
    /// ```
    pub fn tokenize(&self, query: &str, subject_only: bool) -> Result<TokenSet> {
        let len = query.chars().count();
        if len > self.max_query_length {
            return Err(SearchError::QueryTooLong {
                len,
                max: self.max_query_length,
            });
        }
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let mut text: String = decode_entities(query)
            .to_lowercase()
            .chars()
            .map(|c| if is_noise(c) || c.is_whitespace() { ' ' } else { c })
            .collect();
        if text.matches('"').count() % 2 == 1 {
            text.push('"');
        }

        let (phrases, rest) = split_phrases(&text);

        let mut tokens = TokenSet {
            subject_only,
            ..TokenSet::default()
        };
        // Phrases were extracted first and keep priority under the term cap
        let mut required: Vec<(bool, String)> = Vec::new();

        for (negated, phrase) in phrases {
            let is_phrase = phrase.contains(' ');
            self.classify(&mut tokens, &mut required, negated, is_phrase, phrase);
        }

        for raw in rest.split_whitespace() {
            let negated = raw.starts_with('-');
            let word = raw.trim_matches(|c| c == '-' || c == '\'' || c == '"');
            if word.is_empty() {
                continue;
            }
            self.classify(&mut tokens, &mut required, negated, false, word.to_string());
        }

        let mut seen: HashSet<String> = HashSet::new();
        let excluded: HashSet<&String> = tokens
            .excluded_words
            .iter()
            .chain(tokens.excluded_phrases.iter())
            .collect();
        let required: Vec<(bool, String)> = required
            .into_iter()
            .filter(|(_, term)| !excluded.contains(term))
            .filter(|(_, term)| seen.insert(term.clone()))
            .take(self.max_terms)
            .collect();

        for (is_phrase, term) in required {
            if is_phrase {
                tokens.required_phrases.push(term);
            } else {
                tokens.required_words.push(term);
            }
        }
        dedup_in_place(&mut tokens.excluded_words);
        dedup_in_place(&mut tokens.excluded_phrases);
        dedup_in_place(&mut tokens.ignored);

        if tokens.is_empty() {
            if tokens.ignored.is_empty() {
                return Err(SearchError::InvalidSearchString);
            }
            return Err(SearchError::AllTermsIgnored {
                ignored: tokens.ignored,
            });
        }

        Ok(tokens)
    }

    fn classify(
        &self,
        tokens: &mut TokenSet,
        required: &mut Vec<(bool, String)>,
        negated: bool,
        is_phrase: bool,
        term: String,
    ) {
        let too_short = !is_phrase && term.graphemes(true).count() < self.min_word_length;
        if too_short || self.is_stopword(&term) {
            tokens.ignored.push(term);
            return;
        }
        match (negated, is_phrase) {
            (true, true) => tokens.excluded_phrases.push(term),
            (true, false) => tokens.excluded_words.push(term),
            (false, _) => required.push((is_phrase, term)),
        }
    }
}

/// Pull quoted phrases out of `text`
///
/// Returns `(negated, phrase)` pairs with inner whitespace collapsed, and the
/// text with every phrase replaced by a space. Quotes must be balanced.
fn split_phrases(text: &str) -> (Vec<(bool, String)>, String) {
    let mut phrases = Vec::new();
    let mut rest = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '"' {
            rest.push(c);
            continue;
        }

        let negated = {
            let before = rest.strip_suffix('-');
            match before {
                Some(b) => b.is_empty() || b.ends_with(' '),
                None => false,
            }
        };
        if negated {
            rest.pop();
        }

        let inner: String = chars.by_ref().take_while(|&c| c != '"').collect();
        let phrase = inner
            .split_whitespace()
            .map(|w| w.trim_matches('\''))
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !phrase.is_empty() {
            phrases.push((negated, phrase));
        }
        rest.push(' ');
    }

    (phrases, rest)
}

fn dedup_in_place(terms: &mut Vec<String>) {
    let mut seen = HashSet::new();
    terms.retain(|t| seen.insert(t.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer() -> Tokenizer {
        Tokenizer::new(&SearchConfig::default())
    }

    #[test]
    fn test_required_phrase_and_exclusion() {
        let tokens = tokenizer()
            .tokenize("elk -forum \"release notes\"", false)
            .unwrap();
        assert_eq!(tokens.required_words, vec!["elk"]);
        assert_eq!(tokens.required_phrases, vec!["release notes"]);
        assert_eq!(tokens.excluded_words, vec!["forum"]);
        assert!(tokens.excluded_phrases.is_empty());
        assert!(tokens.ignored.is_empty());
    }

    #[test]
    fn test_phrase_not_resplit() {
        let tokens = tokenizer().tokenize("\"alpha beta gamma\"", false).unwrap();
        assert_eq!(tokens.required_phrases, vec!["alpha beta gamma"]);
        assert!(tokens.required_words.is_empty());
    }

    #[test]
    fn test_excluded_phrase() {
        let tokens = tokenizer()
            .tokenize("upgrade -\"known issues\"", false)
            .unwrap();
        assert_eq!(tokens.required_words, vec!["upgrade"]);
        assert_eq!(tokens.excluded_phrases, vec!["known issues"]);
    }

    #[test]
    fn test_hyphen_inside_word_is_not_negation() {
        let tokens = tokenizer().tokenize("e-mail x-\"y z\"", false).unwrap();
        assert!(tokens.required_words.contains(&"e-mail".to_string()));
        assert_eq!(tokens.required_phrases, vec!["y z"]);
        assert!(tokens.excluded_phrases.is_empty());
    }

    #[test]
    fn test_single_word_phrase_is_word() {
        let tokens = tokenizer().tokenize("\"elk\"", false).unwrap();
        assert_eq!(tokens.required_words, vec!["elk"]);
        assert!(tokens.required_phrases.is_empty());
    }

    #[test]
    fn test_unbalanced_quote_closed() {
        let tokens = tokenizer().tokenize("board \"open ended", false).unwrap();
        assert_eq!(tokens.required_words, vec!["board"]);
        assert_eq!(tokens.required_phrases, vec!["open ended"]);
    }

    #[test]
    fn test_case_and_entities_normalized() {
        let tokens = tokenizer()
            .tokenize("Caf&eacute; &quot;Big Deal&quot; CRATE", false)
            .unwrap();
        // Unknown named entities stay undecoded
        assert_eq!(tokens.required_phrases, vec!["big deal"]);
        assert!(tokens.required_words.contains(&"crate".to_string()));
    }

    #[test]
    fn test_numeric_entities() {
        assert_eq!(decode_entities("&#65;&#x42;&amp;"), "AB&");
        assert_eq!(decode_entities("&bogus;"), "&bogus;");
    }

    #[test]
    fn test_punctuation_stripped() {
        let tokens = tokenizer().tokenize("(hello), world!?", false).unwrap();
        assert_eq!(tokens.required_words, vec!["hello", "world"]);
    }

    #[test]
    fn test_stopwords_ignored() {
        let tokens = tokenizer().tokenize("the elk is here", false).unwrap();
        assert_eq!(tokens.required_words, vec!["elk", "here"]);
        assert_eq!(tokens.ignored, vec!["the", "is"]);
    }

    #[test]
    fn test_all_stopwords_is_blacklist_error() {
        let err = tokenizer().tokenize("the is it", false).unwrap_err();
        match err {
            SearchError::AllTermsIgnored { ignored } => {
                assert_eq!(ignored, vec!["the", "is", "it"]);
            }
            other => panic!("expected AllTermsIgnored, got {:?}", other),
        }
    }

    #[test]
    fn test_too_short_is_ignored() {
        let err = tokenizer().tokenize("a b", false).unwrap_err();
        assert!(matches!(err, SearchError::AllTermsIgnored { .. }));
    }

    #[test]
    fn test_no_words_is_invalid() {
        let err = tokenizer().tokenize("?!? ...", false).unwrap_err();
        assert_eq!(err, SearchError::InvalidSearchString);

        let err = tokenizer().tokenize("-only -excluded", false).unwrap_err();
        assert_eq!(err, SearchError::InvalidSearchString);
    }

    #[test]
    fn test_empty_and_too_long() {
        assert_eq!(
            tokenizer().tokenize("   ", false).unwrap_err(),
            SearchError::EmptyQuery
        );
        let long = "word ".repeat(30);
        assert!(matches!(
            tokenizer().tokenize(&long, false).unwrap_err(),
            SearchError::QueryTooLong { len: 150, max: 100 }
        ));
    }

    #[test]
    fn test_dedup_and_cap() {
        let tokens = tokenizer()
            .tokenize("one two three four five six seven eight nine ten eleven one", false)
            .unwrap();
        assert_eq!(tokens.required_len(), 10);
        assert!(!tokens.required_words.contains(&"eleven".to_string()));
        assert_eq!(
            tokens.required_words.iter().filter(|w| *w == "one").count(),
            1
        );
    }

    #[test]
    fn test_phrases_take_priority_under_cap() {
        let mut config = SearchConfig::default();
        config.max_terms = 2;
        let tokens = Tokenizer::new(&config)
            .tokenize("alpha beta \"gamma delta\"", false)
            .unwrap();
        assert_eq!(tokens.required_phrases, vec!["gamma delta"]);
        assert_eq!(tokens.required_words, vec!["alpha"]);
    }

    #[test]
    fn test_required_and_excluded_conflict() {
        let err = tokenizer().tokenize("elk -elk", false).unwrap_err();
        assert_eq!(err, SearchError::InvalidSearchString);
    }

    #[test]
    fn test_unicode_words() {
        let tokens = tokenizer().tokenize("Über Straße", false).unwrap();
        assert_eq!(tokens.required_words, vec!["über", "straße"]);
    }

    #[test]
    fn test_subject_only_recorded() {
        let tokens = tokenizer().tokenize("elk", true).unwrap();
        assert!(tokens.subject_only);
    }
}
