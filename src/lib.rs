//! boardsearch - relevance-ranked, session-cached message search for web forums
//!
//! boardsearch tokenizes free-text queries (quoted phrases, negation,
//! stop-words), hands them to a pluggable matching backend, ranks matching
//! topics on weighted factors and serves highlighted result pages without
//! re-running the match on every page turn.
//!
//! # Quick Start
//!
//! ```
//! use boardsearch::{
//!     BbcRenderer, Caller, ForumServices, MemoryForum, Message, SearchConfig, SearchEngine,
//!     SearchRequest, SearchSession, WordCensor,
//! };
//! use std::sync::Arc;
//!
//! let forum = Arc::new(MemoryForum::new());
//! forum.add_board(1, "General", 1, "Main");
//! forum.insert_message(Message::new(1, 1, 1, "Release notes", "What changed in 2.1"));
//!
//! let engine = SearchEngine::builder(
//!     SearchConfig::default(),
//!     ForumServices {
//!         store: forum.clone(),
//!         members: forum.clone(),
//!         boards: forum.clone(),
//!         permissions: forum,
//!         censor: Arc::new(WordCensor::new::<&str>(&[])),
//!         renderer: Arc::new(BbcRenderer),
//!     },
//! )
//! .build()
//! .unwrap();
//!
//! let mut session = SearchSession::new("abc");
//! let request = SearchRequest::form([("search", "\"release notes\"")]);
//! let page = engine.search(&mut session, &Caller::guest("127.0.0.1"), &request).unwrap();
//! for hit in page.results {
//!     println!("{}. {} ({}%)", hit.rank, hit.subject, hit.relevance_percent());
//! }
//! ```
//!
//! # Architecture
//!
//! Forum records, search parameters and errors live in `boardsearch-core`.
//! Everything that runs a search lives in `boardsearch-search`. Both are
//! re-exported here.

pub use boardsearch_core::*;
pub use boardsearch_search::*;
