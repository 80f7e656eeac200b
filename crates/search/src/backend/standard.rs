//! LIKE-style backend scanning the message store

use super::{rank_hits, Capabilities, MatchRequest, SearchBackend, TermMatcher};
use crate::collaborators::MessageStore;
use crate::scoring::{RelevanceScorer, ResultRow};
use boardsearch_core::Result;
use std::sync::Arc;
use tracing::debug;

/// Scans every candidate message and matches terms as substrings
///
/// Slow on large archives but supports every search mode, so it is the
/// usual last entry of a registry.
pub struct StandardBackend {
    store: Arc<dyn MessageStore>,
    scorer: RelevanceScorer,
}

impl StandardBackend {
    /// Backend over `store`
    pub fn new(store: Arc<dyn MessageStore>, scorer: RelevanceScorer) -> Self {
        StandardBackend { store, scorer }
    }
}

impl SearchBackend for StandardBackend {
    fn name(&self) -> &str {
        "standard"
    }

    fn supports(&self, _capabilities: &Capabilities) -> bool {
        true
    }

    fn enumerate(&self, request: &MatchRequest) -> Result<Vec<ResultRow>> {
        let candidates = self.store.scan(&request.filter)?;
        let matcher = TermMatcher::new(&request.tokens);
        let hits: Vec<_> = candidates.iter().filter_map(|m| matcher.hit(m)).collect();
        debug!(
            target: "boardsearch::backend",
            backend = "standard",
            candidates = candidates.len(),
            hits = hits.len(),
            "Scan finished"
        );
        rank_hits(hits, request, self.store.as_ref(), &self.scorer)
    }
}
