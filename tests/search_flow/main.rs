//! Search Flow Test Suite
//!
//! End-to-end behaviour of the public `boardsearch` API against an
//! in-memory forum.
//!
//! ## Test Tier Structure
//!
//! - **Tier 1: Query Parsing** (words, phrases, negation, stop-words)
//! - **Tier 2: Ranking** (weight profiles, factor ordering, zero-sum fallback)
//! - **Tier 3: Paging and Caching** (lazy pages, cache reuse, invalidation)
//! - **Tier 4: Rendering** (highlighting, compact excerpts, censoring)
//!
//! ## Running Tests
//!
//! ```bash
//! # Run the whole suite
//! cargo test --test search_flow
//!
//! # Run one tier
//! cargo test --test search_flow tier3
//! ```

mod test_utils;

// Tier 1: Query Parsing
mod tier1_query_parsing;

// Tier 2: Ranking
mod tier2_ranking;

// Tier 3: Paging and Caching
mod tier3_paging;

// Tier 4: Rendering
mod tier4_rendering;
