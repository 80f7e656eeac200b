//! Backend driven by an external word index

use super::{rank_hits, Capabilities, MatchRequest, SearchBackend, TermMatcher};
use crate::collaborators::{MessageStore, ScanFilter, WordIndex};
use crate::scoring::{RelevanceScorer, ResultRow};
use boardsearch_core::{MessageId, Result, SearchError};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Finds candidates through a [`WordIndex`], then verifies them
///
/// Candidates are the intersection of the index entries of every required
/// word. Phrases, exclusions and the structural filter are then checked
/// against the stored rows. Subject-only and phrase-only queries are not
/// supported, and neither is anything while the index is still building.
pub struct IndexedBackend {
    index: Arc<dyn WordIndex>,
    store: Arc<dyn MessageStore>,
    scorer: RelevanceScorer,
}

impl IndexedBackend {
    /// Backend over `index` and `store`
    pub fn new(
        index: Arc<dyn WordIndex>,
        store: Arc<dyn MessageStore>,
        scorer: RelevanceScorer,
    ) -> Self {
        IndexedBackend {
            index,
            store,
            scorer,
        }
    }

    fn candidates(&self, words: &[String]) -> Result<Vec<MessageId>> {
        let mut intersection: Option<BTreeSet<MessageId>> = None;
        for word in words {
            let ids: BTreeSet<MessageId> = self.index.messages_with_word(word)?.into_iter().collect();
            intersection = Some(match intersection {
                None => ids,
                Some(acc) => acc.intersection(&ids).copied().collect(),
            });
            if intersection.as_ref().is_some_and(|s| s.is_empty()) {
                break;
            }
        }
        Ok(intersection.unwrap_or_default().into_iter().collect())
    }
}

impl SearchBackend for IndexedBackend {
    fn name(&self) -> &str {
        "indexed"
    }

    fn supports(&self, capabilities: &Capabilities) -> bool {
        self.index.is_ready() && !capabilities.subject_only && !capabilities.phrase_only
    }

    fn enumerate(&self, request: &MatchRequest) -> Result<Vec<ResultRow>> {
        if !self.index.is_ready() {
            return Err(SearchError::backend(self.name(), "word index is not ready"));
        }
        let candidates = self.candidates(&request.tokens.required_words)?;
        if candidates.is_empty() {
            return Err(SearchError::QueryNotSpecificEnough);
        }

        let filter = ScanFilter {
            message_ids: Some(candidates),
            ..request.filter.clone()
        };
        let messages = self.store.scan(&filter)?;
        let matcher = TermMatcher::new(&request.tokens);
        let hits: Vec<_> = messages.iter().filter_map(|m| matcher.hit(m)).collect();
        debug!(
            target: "boardsearch::backend",
            backend = "indexed",
            verified = messages.len(),
            hits = hits.len(),
            "Index lookup finished"
        );
        rank_hits(hits, request, self.store.as_ref(), &self.scorer)
    }
}
