//! Search orchestration
//!
//! [`SearchEngine`] ties the pieces together for one request:
//!
//! ```text
//! SearchRequest
//!      │
//!      ▼
//!  load guard ──► params ──► spam / verification guards (new searches only)
//!                              │
//!                              ▼
//!                          Tokenizer ──► board / poster / age filters
//!                                              │
//!                                              ▼
//!                                     BackendRegistry::select
//!                                     │                    │
//!                                Complete             NeedsCache
//!                                     │                    │
//!                                     │          ResultCache::get_or_create
//!                                     │                    │
//!                                     └────────┬───────────┘
//!                                              ▼
//!                                      ResultAssembler ──► SearchPage
//! ```
//!
//! The engine is stateless across requests apart from the result store;
//! per-user state travels in the [`SearchSession`] the caller passes in.

use crate::assembler::{MatchedMessages, ResultAssembler};
use crate::backend::{
    BackendOutcome, BackendRegistry, IndexedBackend, MatchRequest, SearchBackend, StandardBackend,
};
use crate::cache::{MemoryResultStore, ResultCache, ResultStore};
use crate::collaborators::{ForumServices, PosterFilter, ScanFilter, WordIndex};
use crate::config::SearchConfig;
use crate::guard::{AlwaysVerified, HumanVerifier, LoadGuard, NoLoadGuard, NoSpamGuard, SpamGuard};
use crate::highlight::{HighlightConfig, Highlighter};
use crate::scoring::{RelevanceScorer, ResultRow};
use crate::session::SearchSession;
use crate::tokenizer::Tokenizer;
use boardsearch_core::limits::{MAX_AGE_DAYS, SECONDS_PER_DAY};
use boardsearch_core::{BoardId, Caller, Result, SearchError, SearchParams, TokenSet, UserFilter};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

// ============================================================================
// Request / page types
// ============================================================================

/// Where the parameters of a request come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchInput {
    /// Freshly submitted form fields
    Form(Vec<(String, String)>),
    /// Encoded params from a result link
    Encoded(String),
}

/// One search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Parameters
    pub input: SearchInput,
    /// Offset of the first result to show
    pub start: usize,
    /// Answer to the human verification challenge, if any
    pub verification: Option<String>,
}

impl SearchRequest {
    /// Request from form fields
    pub fn form<K, V, I>(fields: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        SearchRequest {
            input: SearchInput::Form(
                fields
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            start: 0,
            verification: None,
        }
    }

    /// Request from encoded params
    pub fn encoded(params: impl Into<String>) -> Self {
        SearchRequest {
            input: SearchInput::Encoded(params.into()),
            start: 0,
            verification: None,
        }
    }

    /// Builder: result offset
    pub fn with_start(mut self, start: usize) -> Self {
        self.start = start;
        self
    }

    /// Builder: verification answer
    pub fn with_verification(mut self, answer: impl Into<String>) -> Self {
        self.verification = Some(answer.into());
        self
    }
}

/// Outcome of a search that ran without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    /// Results (possibly an out-of-range empty page)
    Results,
    /// Matching found nothing; the empty set is cached
    QueryNotSpecificEnough,
}

/// One page of search results
#[derive(Debug)]
pub struct SearchPage {
    /// Normalized parameters
    pub params: SearchParams,
    /// Encoded parameters, for page links
    pub encoded_params: String,
    /// Terms searched for
    pub tokens: TokenSet,
    /// Size of the full result set
    pub total: usize,
    /// Offset of this page
    pub start: usize,
    /// Page size
    pub per_page: usize,
    /// Outcome
    pub status: PageStatus,
    /// Backend that produced the rows
    pub backend: String,
    /// True when the rows came from the session's result cache
    pub from_cache: bool,
    /// Assembled results
    pub results: MatchedMessages,
}

impl SearchPage {
    /// Number of pages in the full result set
    pub fn page_count(&self) -> usize {
        let per_page = self.per_page.max(1);
        (self.total + per_page - 1) / per_page
    }

    /// Whether a page follows this one
    pub fn has_next(&self) -> bool {
        self.start.saturating_add(self.per_page) < self.total
    }
}

// ============================================================================
// SearchEngine
// ============================================================================

/// Builder for [`SearchEngine`]
pub struct SearchEngineBuilder {
    config: SearchConfig,
    services: ForumServices,
    backends: Vec<Arc<dyn SearchBackend>>,
    word_index: Option<Arc<dyn WordIndex>>,
    result_store: Option<Arc<dyn ResultStore>>,
    load_guard: Arc<dyn LoadGuard>,
    spam_guard: Arc<dyn SpamGuard>,
    verifier: Arc<dyn HumanVerifier>,
}

impl SearchEngineBuilder {
    /// Register a backend ahead of the bundled ones
    ///
    /// Backends added this way are probed in insertion order, before the
    /// indexed backend (when a word index is set) and the standard backend.
    pub fn with_backend(mut self, backend: Arc<dyn SearchBackend>) -> Self {
        self.backends.push(backend);
        self
    }

    /// Enable the indexed backend over `index`
    pub fn with_word_index(mut self, index: Arc<dyn WordIndex>) -> Self {
        self.word_index = Some(index);
        self
    }

    /// Store cached rows in `store` instead of process memory
    pub fn with_result_store(mut self, store: Arc<dyn ResultStore>) -> Self {
        self.result_store = Some(store);
        self
    }

    /// Set the load guard
    pub fn with_load_guard(mut self, guard: Arc<dyn LoadGuard>) -> Self {
        self.load_guard = guard;
        self
    }

    /// Set the flood guard
    pub fn with_spam_guard(mut self, guard: Arc<dyn SpamGuard>) -> Self {
        self.spam_guard = guard;
        self
    }

    /// Set the human verifier
    pub fn with_verifier(mut self, verifier: Arc<dyn HumanVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Validate the configuration and build the engine
    ///
    /// # Errors
    ///
    /// `Config` when the configuration is out of range.
    pub fn build(self) -> Result<SearchEngine> {
        self.config.validate()?;
        let scorer = RelevanceScorer::from_config(&self.config);

        let mut registry = BackendRegistry::new();
        for backend in self.backends {
            registry.register(backend);
        }
        if let Some(index) = self.word_index {
            registry.register(Arc::new(IndexedBackend::new(
                index,
                Arc::clone(&self.services.store),
                scorer.clone(),
            )));
        }
        registry.register(Arc::new(StandardBackend::new(
            Arc::clone(&self.services.store),
            scorer,
        )));

        let store = self
            .result_store
            .unwrap_or_else(|| Arc::new(MemoryResultStore::new()));
        let cache = ResultCache::new(
            store,
            self.config.cache_modulus,
            self.config.cache_ttl_secs,
            self.config.max_results,
        );
        let highlighter = Highlighter::new(HighlightConfig::from(&self.config));

        debug!(target: "boardsearch::engine", backends = ?registry.names(), "Search engine ready");
        Ok(SearchEngine {
            tokenizer: Tokenizer::new(&self.config),
            assembler: ResultAssembler::new(self.services.clone(), highlighter),
            config: self.config,
            services: self.services,
            registry,
            cache,
            load_guard: self.load_guard,
            spam_guard: self.spam_guard,
            verifier: self.verifier,
        })
    }
}

/// Forum search engine
pub struct SearchEngine {
    config: SearchConfig,
    tokenizer: Tokenizer,
    services: ForumServices,
    registry: BackendRegistry,
    cache: ResultCache,
    assembler: ResultAssembler,
    load_guard: Arc<dyn LoadGuard>,
    spam_guard: Arc<dyn SpamGuard>,
    verifier: Arc<dyn HumanVerifier>,
}

impl SearchEngine {
    /// Start building an engine over `services`
    pub fn builder(config: SearchConfig, services: ForumServices) -> SearchEngineBuilder {
        SearchEngineBuilder {
            config,
            services,
            backends: Vec::new(),
            word_index: None,
            result_store: None,
            load_guard: Arc::new(NoLoadGuard),
            spam_guard: Arc::new(NoSpamGuard),
            verifier: Arc::new(AlwaysVerified),
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Backend registry, highest priority first
    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Drop the session's cached results
    pub fn invalidate(&self, session: &mut SearchSession) {
        self.cache.invalidate(session);
    }

    /// Run one search request
    ///
    /// # Errors
    ///
    /// - `Overloaded` when the load guard reports more than `load_limit`
    /// - parameter and tokenizer errors (`EmptyQuery`, `QueryTooLong`, ...)
    /// - `FloodProtection` / `VerificationFailed` for new searches
    /// - `NoBoardsAvailable` when no requested board is visible
    /// - `NoBackendAvailable`, `Backend` and `Storage` from collaborators
    ///
    /// A search that matches nothing is not an error: the page comes back
    /// empty with [`PageStatus::QueryNotSpecificEnough`].
    pub fn search(
        &self,
        session: &mut SearchSession,
        caller: &Caller,
        request: &SearchRequest,
    ) -> Result<SearchPage> {
        self.check_load()?;

        let params = match &request.input {
            SearchInput::Form(fields) => {
                SearchParams::from_pairs(fields.iter().cloned(), self.config.max_query_length)?
            }
            SearchInput::Encoded(encoded) => {
                SearchParams::decode(encoded, self.config.max_query_length)?
            }
        };

        if !session.is_repeat(&params.search) {
            self.spam_guard.check(caller)?;
            if self.config.guest_verification
                && caller.is_guest()
                && !self.verifier.verify(caller, request.verification.as_deref())
            {
                return Err(SearchError::VerificationFailed);
            }
            session.set_last_search(params.search.clone());
        }

        let tokens = self.tokenizer.tokenize(&params.search, params.subject_only)?;
        let filter = self.scan_filter(caller, &params)?;
        let newest_post = self
            .services
            .store
            .latest_post_time()?
            .unwrap_or_else(|| chrono::Utc::now().timestamp());

        let match_request = MatchRequest {
            tokens,
            params,
            filter,
            newest_post,
        };
        let backend = self.registry.select(&match_request.capabilities())?;
        let encoded_params = match_request.params.encode();
        let per_page = self.config.results_per_page;
        let start = request.start;

        let (rows, total, best, from_cache, status) =
            match backend.search(&match_request, start, per_page)? {
                BackendOutcome::Complete(page) => {
                    // A self-paginating backend leaves no cache behind
                    if session.slot().is_some_and(|s| s.params != encoded_params) {
                        self.cache.invalidate(session);
                    }
                    let best = page.rows.iter().map(|r| r.relevance).max().unwrap_or(0);
                    (page.rows, page.total, best, false, PageStatus::Results)
                }
                BackendOutcome::NeedsCache => {
                    let (set, hit) = self.cache.get_or_create(session, &encoded_params, || {
                        enumerate_or_empty(backend.as_ref(), &match_request)
                    })?;
                    let status = if set.total() == 0 {
                        PageStatus::QueryNotSpecificEnough
                    } else {
                        PageStatus::Results
                    };
                    let rows = self.cache.page(&set, start, per_page);
                    (rows, set.total(), set.best_relevance(), hit, status)
                }
            };

        debug!(
            target: "boardsearch::engine",
            backend = backend.name(),
            total,
            start,
            from_cache,
            "Search served"
        );

        let results = self
            .assembler
            .assemble(caller, rows, &match_request.tokens, match_request.params.compact)?
            .starting_at(start.saturating_add(1))
            .relative_to(best);

        Ok(SearchPage {
            params: match_request.params,
            encoded_params,
            tokens: match_request.tokens,
            total,
            start,
            per_page,
            status,
            backend: backend.name().to_string(),
            from_cache,
            results,
        })
    }

    fn check_load(&self) -> Result<()> {
        if let (Some(limit), Some(load)) = (self.config.load_limit, self.load_guard.current_load()) {
            if load > limit {
                return Err(SearchError::Overloaded);
            }
        }
        Ok(())
    }

    /// Structural filter for `params` as seen by `caller`
    fn scan_filter(&self, caller: &Caller, params: &SearchParams) -> Result<ScanFilter> {
        let visible: BTreeSet<BoardId> = self
            .services
            .permissions
            .visible_boards(caller)?
            .into_iter()
            .collect();

        let boards: Vec<BoardId> = if params.boards.is_empty() && params.categories.is_empty() {
            visible.into_iter().collect()
        } else {
            let mut wanted: BTreeSet<BoardId> = params.boards.iter().copied().collect();
            if !params.categories.is_empty() {
                wanted.extend(
                    self.services
                        .boards
                        .boards()?
                        .into_iter()
                        .filter(|b| params.categories.contains(&b.category_id))
                        .map(|b| b.id),
                );
            }
            wanted.intersection(&visible).copied().collect()
        };
        if boards.is_empty() {
            return Err(SearchError::NoBoardsAvailable);
        }

        let posters = match &params.user_filter {
            UserFilter::Anyone => None,
            UserFilter::Named(names) => {
                let members = self.services.members.find_by_names(names)?;
                Some(PosterFilter {
                    member_ids: members.iter().map(|m| m.id).collect(),
                    names: names.iter().map(|n| n.to_lowercase()).collect(),
                })
            }
        };

        let now = chrono::Utc::now().timestamp();
        let posted_after = (params.max_age < MAX_AGE_DAYS)
            .then(|| now - params.max_age as i64 * SECONDS_PER_DAY);
        let posted_before =
            (params.min_age > 0).then(|| now - params.min_age as i64 * SECONDS_PER_DAY);

        Ok(ScanFilter {
            boards: Some(boards),
            topic: params.topic,
            posters,
            posted_after,
            posted_before,
            message_ids: None,
        })
    }
}

/// Full enumeration, with an empty match set cached as such
fn enumerate_or_empty(backend: &dyn SearchBackend, request: &MatchRequest) -> Result<Vec<ResultRow>> {
    match backend.enumerate(request) {
        Err(SearchError::QueryNotSpecificEnough) => Ok(Vec::new()),
        other => other,
    }
}
