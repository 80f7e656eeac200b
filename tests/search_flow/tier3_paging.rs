//! Tier 3: Paging and Caching
//!
//! Result sets are enumerated once per session and parameter set, then
//! paged from the cache.

use crate::test_utils::*;
use boardsearch::{
    MemoryResultStore, Message, PageStatus, SearchConfig, SearchEngine, SearchRequest,
    SearchSession,
};
use std::collections::HashSet;
use std::sync::Arc;

#[test]
fn tier3_walking_pages_covers_the_set_once() {
    let forum = create_forum();
    populate_elk_topics(&forum, 65);
    let engine = create_engine(&forum, SearchConfig::default());
    let mut session = SearchSession::new("t3");

    let first = engine.search(&mut session, &guest(), &query("elk")).unwrap();
    assert_eq!(first.page_count(), 3);
    assert!(!first.from_cache);
    let encoded = first.encoded_params.clone();

    let mut seen: HashSet<u64> = first.results.map(|m| m.message_id.0).collect();
    let mut ranks = Vec::new();
    for start in [30, 60] {
        let page = engine
            .search(&mut session, &guest(), &SearchRequest::encoded(encoded.clone()).with_start(start))
            .unwrap();
        assert!(page.from_cache);
        assert_eq!(page.total, 65);
        for hit in page.results {
            ranks.push(hit.rank);
            assert!(seen.insert(hit.message_id.0), "message listed twice");
        }
    }

    assert_eq!(seen.len(), 65);
    assert_eq!(ranks, (31..=65).collect::<Vec<_>>());
}

#[test]
fn tier3_page_past_the_end_is_empty() {
    let forum = create_forum();
    populate_elk_topics(&forum, 5);
    let engine = create_engine(&forum, SearchConfig::default());
    let mut session = SearchSession::new("t3");

    let page = engine
        .search(&mut session, &guest(), &query("elk").with_start(500))
        .unwrap();

    assert_eq!(page.total, 5);
    assert_eq!(page.status, PageStatus::Results);
    assert!(!page.has_next());
    assert_eq!(page.results.count(), 0);
}

#[test]
fn tier3_results_can_be_replayed_after_reset() {
    let forum = create_forum();
    populate_elk_topics(&forum, 4);
    let engine = create_engine(&forum, SearchConfig::default());
    let mut session = SearchSession::new("t3");

    let mut results = engine.search(&mut session, &guest(), &query("elk")).unwrap().results;
    let first: Vec<(usize, u64)> = results.by_ref().map(|m| (m.rank, m.message_id.0)).collect();
    assert!(results.next().is_none());

    results.reset();
    let second: Vec<(usize, u64)> = results.map(|m| (m.rank, m.message_id.0)).collect();

    assert_eq!(first.len(), 4);
    assert_eq!(first, second);
}

#[test]
fn tier3_new_params_replace_the_cached_set() {
    let forum = create_forum();
    populate_elk_topics(&forum, 40);
    forum.insert_message(Message::new(900, 900, 1, "Moose", "a moose").with_posted_at(NOW));
    let store = Arc::new(MemoryResultStore::new());
    init_logging();
    let engine = SearchEngine::builder(SearchConfig::default(), services(&forum))
        .with_result_store(store.clone())
        .build()
        .unwrap();
    let mut session = SearchSession::new("t3");

    let elk = engine.search(&mut session, &guest(), &query("elk")).unwrap();
    let elk_pointer = session.pointer();
    assert_eq!(store.len(), 1);

    let moose = engine.search(&mut session, &guest(), &query("moose")).unwrap();
    assert!(!moose.from_cache);
    assert_eq!(moose.total, 1);
    assert_ne!(session.pointer(), elk_pointer);
    assert_eq!(store.len(), 1);

    // Page 2 of the earlier search must be enumerated again
    let again = engine
        .search(&mut session, &guest(), &SearchRequest::encoded(elk.encoded_params).with_start(30))
        .unwrap();
    assert!(!again.from_cache);
    assert_eq!(again.total, 40);
    assert_eq!(again.results.count(), 10);
}

#[test]
fn tier3_explicit_invalidation_forces_enumeration() {
    let forum = create_forum();
    populate_elk_topics(&forum, 3);
    let engine = create_engine(&forum, SearchConfig::default());
    let mut session = SearchSession::new("t3");

    engine.search(&mut session, &guest(), &query("elk")).unwrap();
    assert!(session.slot().is_some());
    engine.invalidate(&mut session);
    assert!(session.slot().is_none());

    let page = engine.search(&mut session, &guest(), &query("elk")).unwrap();
    assert!(!page.from_cache);
}

#[test]
fn tier3_relevance_percent_is_relative_to_whole_set() {
    let forum = create_forum();
    populate_elk_topics(&forum, 35);
    let engine = create_engine(&forum, SearchConfig::default());
    let mut session = SearchSession::new("t3");

    let first = engine.search(&mut session, &guest(), &query("elk")).unwrap();
    let encoded = first.encoded_params.clone();
    let top = first.results.map(|m| m.relevance_percent()).next().unwrap();
    assert_eq!(top, 100);

    let second = engine
        .search(&mut session, &guest(), &SearchRequest::encoded(encoded).with_start(30))
        .unwrap();
    let percents: Vec<u32> = second.results.map(|m| m.relevance_percent()).collect();
    assert_eq!(percents.len(), 5);
    assert!(percents.iter().all(|p| *p <= 100));
}

#[test]
fn tier3_age_window_uses_wall_clock() {
    let forum = create_forum();
    let now = chrono::Utc::now().timestamp();
    forum.insert_message(Message::new(1, 1, 1, "Recent elk", "this week").with_posted_at(now - 2 * DAY));
    forum.insert_message(Message::new(2, 2, 1, "Older elk", "last month").with_posted_at(now - 40 * DAY));
    let engine = create_engine(&forum, SearchConfig::default());
    let mut session = SearchSession::new("t3");

    let recent = SearchRequest::form([("search", "elk"), ("maxage", "7")]);
    let page = engine.search(&mut session, &guest(), &recent).unwrap();
    let ids: Vec<u64> = page.results.map(|m| m.message_id.0).collect();
    assert_eq!(ids, vec![1]);

    let older = SearchRequest::form([("search", "elk"), ("minage", "30")]);
    let page = engine.search(&mut session, &guest(), &older).unwrap();
    let ids: Vec<u64> = page.results.map(|m| m.message_id.0).collect();
    assert_eq!(ids, vec![2]);
}
