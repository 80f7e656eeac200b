//! Tier 1: Query Parsing
//!
//! The query string as the engine sees it: words, quoted phrases, negation
//! and the stop-word list.

use crate::test_utils::*;
use boardsearch::{Message, SearchConfig, SearchError, SearchParams, SearchSession};

#[test]
fn tier1_mixed_query_splits_into_words_phrases_and_exclusions() {
    let forum = create_forum();
    forum.insert_message(Message::new(1, 1, 1, "Elk", "the release notes mention an elk"));
    let engine = create_engine(&forum, SearchConfig::default());
    let mut session = SearchSession::new("t1");

    let page = engine
        .search(&mut session, &guest(), &query("elk -forum \"release notes\""))
        .unwrap();

    assert_eq!(page.tokens.required_words, vec!["elk".to_string()]);
    assert_eq!(page.tokens.required_phrases, vec!["release notes".to_string()]);
    assert_eq!(page.tokens.excluded_words, vec!["forum".to_string()]);
    assert_eq!(page.total, 1);
}

#[test]
fn tier1_quoted_phrase_is_never_split() {
    let forum = create_forum();
    forum.insert_message(Message::new(1, 1, 1, "Greek", "alpha beta gamma in order"));
    forum.insert_message(Message::new(2, 2, 1, "Greek", "gamma beta alpha reversed"));
    let engine = create_engine(&forum, SearchConfig::default());
    let mut session = SearchSession::new("t1");

    let page = engine
        .search(&mut session, &guest(), &query("\"alpha beta gamma\""))
        .unwrap();

    assert!(page.tokens.required_words.is_empty());
    assert_eq!(page.tokens.required_phrases, vec!["alpha beta gamma".to_string()]);
    let ids: Vec<u64> = page.results.map(|m| m.message_id.0).collect();
    assert_eq!(ids, vec![1]);
}

#[test]
fn tier1_excluded_word_removes_matches() {
    let forum = create_forum();
    forum.insert_message(Message::new(1, 1, 1, "Elk", "an elk in the forest"));
    forum.insert_message(Message::new(2, 2, 1, "Elk", "an elk on the forum banner"));
    let engine = create_engine(&forum, SearchConfig::default());
    let mut session = SearchSession::new("t1");

    let page = engine.search(&mut session, &guest(), &query("elk -forum")).unwrap();

    let ids: Vec<u64> = page.results.map(|m| m.message_id.0).collect();
    assert_eq!(ids, vec![1]);
}

#[test]
fn tier1_only_stopwords_is_all_terms_ignored() {
    let forum = create_forum();
    populate_elk_topics(&forum, 3);
    let engine = create_engine(&forum, SearchConfig::default());
    let mut session = SearchSession::new("t1");

    let err = engine
        .search(&mut session, &guest(), &query("the is it"))
        .err()
        .unwrap();

    assert!(matches!(err, SearchError::AllTermsIgnored { .. }));
    assert!(!matches!(err, SearchError::InvalidSearchString));
    assert!(err.is_user_error());
}

#[test]
fn tier1_stopwords_are_reported_but_not_required() {
    let forum = create_forum();
    populate_elk_topics(&forum, 2);
    let engine = create_engine(&forum, SearchConfig::default());
    let mut session = SearchSession::new("t1");

    let page = engine.search(&mut session, &guest(), &query("the elk")).unwrap();

    assert_eq!(page.tokens.required_words, vec!["elk".to_string()]);
    assert_eq!(page.tokens.ignored, vec!["the".to_string()]);
    assert_eq!(page.total, 2);
}

#[test]
fn tier1_term_count_is_capped() {
    let forum = create_forum();
    forum.insert_message(Message::new(1, 1, 1, "Words", "aa bb cc dd ee ff gg hh ii jj kk ll"));
    let mut config = SearchConfig::default();
    config.max_terms = 4;
    let engine = create_engine(&forum, config);
    let mut session = SearchSession::new("t1");

    let page = engine
        .search(&mut session, &guest(), &query("aa bb cc dd ee ff gg hh"))
        .unwrap();

    assert_eq!(page.tokens.required_len(), 4);
    assert_eq!(page.total, 1);
}

#[test]
fn tier1_encoded_params_decode_to_page_params() {
    let forum = create_forum();
    populate_elk_topics(&forum, 1);
    let engine = create_engine(&forum, SearchConfig::default());
    let mut session = SearchSession::new("t1");
    let request = boardsearch::SearchRequest::form([
        ("search", "elk \"walked by\""),
        ("sort", "num_replies"),
        ("sort_dir", "asc"),
        ("brd", "1"),
        ("maxage", "30"),
    ]);

    let page = engine.search(&mut session, &guest(), &request).unwrap();

    let decoded = SearchParams::decode(&page.encoded_params, 100).unwrap();
    assert_eq!(decoded, page.params);
    assert_eq!(decoded.encode(), page.encoded_params);
}

#[test]
fn tier1_phrase_matches_across_line_breaks() {
    let forum = create_forum();
    forum.insert_message(Message::new(1, 1, 1, "Changelog", "read the release\nnotes first"));
    forum.insert_message(Message::new(2, 2, 1, "Changelog", "release  notes, double spaced"));
    forum.insert_message(Message::new(3, 3, 1, "Changelog", "notes about the release"));
    let engine = create_engine(&forum, SearchConfig::default());
    let mut session = SearchSession::new("t1");

    let page = engine
        .search(&mut session, &guest(), &query("\"release notes\""))
        .unwrap();

    let mut ids: Vec<u64> = page.results.map(|m| m.message_id.0).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2]);
}
