//! Pluggable matching backends
//!
//! This module provides:
//! - SearchBackend trait for matching strategies
//! - Capabilities describing what a request needs from a backend
//! - MatchRequest, the per-request input handed to a backend
//! - BackendOutcome / RankedPage
//! - BackendRegistry: priority-ordered selection
//! - TermMatcher: substring matching shared by the bundled backends
//!
//! # Architecture
//!
//! ```text
//! MatchRequest ──► BackendRegistry::select(capabilities)
//!                        │
//!                        ▼
//!                  SearchBackend::search(offset, limit)
//!                   │                         │
//!          Complete(RankedPage)          NeedsCache
//!                   │                         │
//!                   ▼                         ▼
//!              page served          ResultCache ──► enumerate()
//! ```
//!
//! A backend that ranks and paginates by itself returns `Complete` and the
//! result cache is bypassed. Enumerating backends return `NeedsCache` and
//! produce the full ordered match set once through `enumerate`.

mod indexed;
mod standard;

pub use indexed::IndexedBackend;
pub use standard::StandardBackend;

use crate::collaborators::{MessageStore, ScanFilter};
use crate::scoring::{sort_rows, MessageHit, RelevanceScorer, ResultRow};
use boardsearch_core::{Message, Result, SearchError, SearchParams, SortKey, Term, TokenSet};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

// ============================================================================
// Request types
// ============================================================================

/// What a request needs from a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Match subjects only
    pub subject_only: bool,
    /// No required words, only phrases
    pub phrase_only: bool,
    /// At least one excluded term
    pub has_exclusions: bool,
    /// One row per matching message instead of per topic
    pub per_message: bool,
    /// Requested ordering
    pub sort: SortKey,
}

impl Capabilities {
    /// Derive capabilities from a tokenized request
    pub fn for_request(tokens: &TokenSet, params: &SearchParams) -> Self {
        Capabilities {
            subject_only: tokens.subject_only,
            phrase_only: tokens.is_phrase_only(),
            has_exclusions: !tokens.excluded_words.is_empty()
                || !tokens.excluded_phrases.is_empty(),
            per_message: params.show_complete,
            sort: params.sort,
        }
    }
}

/// Input to a backend for one search
#[derive(Debug, Clone)]
pub struct MatchRequest {
    /// Canonical terms
    pub tokens: TokenSet,
    /// Normalized parameters
    pub params: SearchParams,
    /// Structural filter resolved from the parameters and permissions
    pub filter: ScanFilter,
    /// Posting time of the newest message in the archive, for the age factor
    pub newest_post: i64,
}

impl MatchRequest {
    /// Capabilities this request needs
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::for_request(&self.tokens, &self.params)
    }
}

/// One page of ranked rows plus the size of the full set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedPage {
    /// Rows of this page, in order
    pub rows: Vec<ResultRow>,
    /// Total matches across all pages
    pub total: usize,
}

/// Result of [`SearchBackend::search`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOutcome {
    /// The backend ranked and paginated by itself
    Complete(RankedPage),
    /// The caller must enumerate through the result cache
    NeedsCache,
}

// ============================================================================
// SearchBackend trait
// ============================================================================

/// A matching strategy
///
/// Implementations must be Send + Sync; the registry shares them across
/// requests.
pub trait SearchBackend: Send + Sync {
    /// Name for logging and error reports
    fn name(&self) -> &str;

    /// Whether this backend can serve a request with these capabilities
    fn supports(&self, capabilities: &Capabilities) -> bool;

    /// Try to serve one page directly
    ///
    /// The default asks for the cache path.
    fn search(
        &self,
        _request: &MatchRequest,
        _offset: usize,
        _limit: usize,
    ) -> Result<BackendOutcome> {
        Ok(BackendOutcome::NeedsCache)
    }

    /// Produce the full ordered match set
    ///
    /// # Errors
    ///
    /// `QueryNotSpecificEnough` when nothing matches.
    fn enumerate(&self, request: &MatchRequest) -> Result<Vec<ResultRow>>;
}

// ============================================================================
// BackendRegistry
// ============================================================================

/// Backends in priority order
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: Vec<Arc<dyn SearchBackend>>,
}

impl BackendRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a backend with lower priority than those already registered
    pub fn register(&mut self, backend: Arc<dyn SearchBackend>) {
        self.backends.push(backend);
    }

    /// Builder: append a backend
    pub fn with_backend(mut self, backend: Arc<dyn SearchBackend>) -> Self {
        self.register(backend);
        self
    }

    /// Registered backend names, highest priority first
    pub fn names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// First backend supporting `capabilities`
    ///
    /// # Errors
    ///
    /// `NoBackendAvailable` when none does.
    pub fn select(&self, capabilities: &Capabilities) -> Result<Arc<dyn SearchBackend>> {
        let backend = self
            .backends
            .iter()
            .find(|b| b.supports(capabilities))
            .cloned()
            .ok_or(SearchError::NoBackendAvailable)?;
        debug!(target: "boardsearch::backend", backend = backend.name(), ?capabilities, "Backend selected");
        Ok(backend)
    }
}

// ============================================================================
// TermMatcher
// ============================================================================

/// Case-insensitive substring matching of a token set against messages
#[derive(Debug, Clone)]
pub struct TermMatcher<'a> {
    tokens: &'a TokenSet,
}

impl<'a> TermMatcher<'a> {
    /// Matcher for `tokens`
    pub fn new(tokens: &'a TokenSet) -> Self {
        TermMatcher { tokens }
    }

    /// Hit for `message` when it contains every required term and no
    /// excluded term
    ///
    /// Subject-only token sets look at the subject alone; otherwise a term
    /// may sit in the subject or the body.
    pub fn hit(&self, message: &Message) -> Option<MessageHit> {
        let subject = fold_text(&message.subject);
        let body = if self.tokens.subject_only {
            String::new()
        } else {
            fold_text(&message.body)
        };
        let found = |t: &Term| subject.contains(t.text()) || body.contains(t.text());

        if !self.tokens.required_terms().all(|t| found(&t)) {
            return None;
        }
        if self.tokens.excluded_terms().any(|t| found(&t)) {
            return None;
        }

        Some(MessageHit {
            message_id: message.id,
            topic_id: message.topic_id,
            posted_at: message.posted_at,
            subject_matched: self.tokens.required_terms().all(|t| subject.contains(t.text())),
            likes: message.likes,
        })
    }
}

/// Lowercase `text` with every whitespace run folded to one space
///
/// Phrases arrive single-spaced from the tokenizer, so a line-broken phrase
/// in a message still matches.
fn fold_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Score, order and check the hits of an enumeration
///
/// Shared tail of the bundled backends.
pub(crate) fn rank_hits(
    hits: Vec<MessageHit>,
    request: &MatchRequest,
    store: &dyn MessageStore,
    scorer: &RelevanceScorer,
) -> Result<Vec<ResultRow>> {
    if hits.is_empty() {
        return Err(SearchError::QueryNotSpecificEnough);
    }
    let mut topic_ids: Vec<_> = hits.iter().map(|h| h.topic_id).collect();
    topic_ids.sort_unstable();
    topic_ids.dedup();
    let topics: HashMap<_, _> = store
        .topics(&topic_ids)?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

    let mut rows = scorer.score(
        hits,
        &topics,
        request.newest_post,
        request.params.show_complete,
    );
    if rows.is_empty() {
        return Err(SearchError::QueryNotSpecificEnough);
    }
    sort_rows(&mut rows, request.params.sort, request.params.sort_dir);
    Ok(rows)
}
