//! Search engine for boardsearch
//!
//! This crate provides:
//! - SearchConfig loaded from `boardsearch.toml`
//! - Tokenizer turning raw queries into TokenSets
//! - WeightProfile and RelevanceScorer for multi-factor ranking
//! - SearchBackend trait, BackendRegistry and the standard / indexed backends
//! - ResultCache and SearchSession for session-scoped paging
//! - Highlighter and ResultAssembler for rendering result pages
//! - Collaborator traits plus in-memory implementations
//! - SearchEngine orchestrating a request end to end
//!
//! # Usage
//!
//! ```
//! use boardsearch_search::{
//!     BbcRenderer, ForumServices, MemoryForum, SearchConfig, SearchEngine, SearchRequest,
//!     SearchSession, WordCensor,
//! };
//! use boardsearch_core::{Caller, Message};
//! use std::sync::Arc;
//!
//! let forum = Arc::new(MemoryForum::new());
//! forum.add_board(1, "General", 1, "Main");
//! forum.insert_message(Message::new(1, 1, 1, "Elk sighting", "A large elk by the lake"));
//!
//! let services = ForumServices {
//!     store: forum.clone(),
//!     members: forum.clone(),
//!     boards: forum.clone(),
//!     permissions: forum,
//!     censor: Arc::new(WordCensor::new::<&str>(&[])),
//!     renderer: Arc::new(BbcRenderer),
//! };
//! let engine = SearchEngine::builder(SearchConfig::default(), services).build().unwrap();
//!
//! let mut session = SearchSession::new("session-1");
//! let page = engine
//!     .search(&mut session, &Caller::guest("127.0.0.1"), &SearchRequest::form([("search", "elk")]))
//!     .unwrap();
//! assert_eq!(page.total, 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assembler;
pub mod backend;
pub mod cache;
pub mod collaborators;
pub mod config;
pub mod engine;
pub mod guard;
pub mod highlight;
pub mod markup;
pub mod memory;
pub mod scoring;
pub mod session;
pub mod tokenizer;
pub mod weights;

// Re-export commonly used types
pub use assembler::{MatchedMessage, MatchedMessages, ResultAssembler};
pub use backend::{
    BackendOutcome, BackendRegistry, Capabilities, IndexedBackend, MatchRequest, RankedPage,
    SearchBackend, StandardBackend, TermMatcher,
};
pub use cache::{CachedResultSet, MemoryResultStore, ResultCache, ResultStore, StoredResults};
pub use collaborators::{
    BoardDirectory, Censor, ForumServices, MarkupRenderer, MemberDirectory, MessageStore,
    Permissions, PosterFilter, ScanFilter, WordIndex,
};
pub use config::{SearchConfig, CONFIG_FILE_NAME, DEFAULT_STOPWORDS};
pub use engine::{PageStatus, SearchEngine, SearchEngineBuilder, SearchInput, SearchPage, SearchRequest};
pub use guard::{
    AlwaysVerified, AnswerVerifier, HumanVerifier, IntervalSpamGuard, LoadGuard, NoLoadGuard,
    NoSpamGuard, ReportedLoad, SpamGuard,
};
pub use highlight::{strip_tags, HighlightConfig, Highlighter};
pub use markup::{escape_html, BbcRenderer, WordCensor};
pub use memory::{MemoryForum, MemoryWordIndex};
pub use scoring::{sort_rows, FactorScores, MessageHit, RelevanceScorer, ResultRow};
pub use session::{CacheSlot, SearchSession};
pub use tokenizer::{decode_entities, Tokenizer};
pub use weights::{Factor, WeightProfile};
