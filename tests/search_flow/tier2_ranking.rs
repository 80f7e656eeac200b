//! Tier 2: Ranking
//!
//! Weight profiles loaded from configuration and their effect on result
//! order.

use crate::test_utils::*;
use boardsearch::{MemoryForum, Message, SearchConfig, SearchRequest, SearchSession, TopicId};
use std::sync::Arc;

/// Topic 1: small, recent, elk in the opening subject.
/// Topic 2: long, old, elk only in a body.
fn populate_ranking_forum(forum: &MemoryForum) {
    forum.insert_message(
        Message::new(1, 1, 1, "Elk migration", "spring herd").with_posted_at(NOW - 2 * DAY),
    );
    for id in 2..=6 {
        forum.insert_message(
            Message::new(id, 1, 1, "Re: migration", "following").with_posted_at(NOW - 2 * DAY),
        );
    }
    forum.insert_message(
        Message::new(100, 2, 1, "Wildlife log", "saw an elk").with_posted_at(NOW - 200 * DAY),
    );
    forum.set_num_replies(TopicId(2), 50);
    forum.insert_message(Message::new(500, 3, 1, "Today", "weather").with_posted_at(NOW));
}

fn relevances(forum: &Arc<MemoryForum>, config: SearchConfig) -> Vec<(u64, u32)> {
    let engine = create_engine(forum, config);
    let mut session = SearchSession::new("t2");
    let page = engine.search(&mut session, &guest(), &query("elk")).unwrap();
    page.results.map(|m| (m.topic_id.0, m.relevance)).collect()
}

#[test]
fn tier2_configured_profile_prefers_small_recent_subject_match() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(boardsearch::CONFIG_FILE_NAME);
    std::fs::write(
        &path,
        "[weights]\nfrequency = 30\nage = 25\nlength = 20\nsubject = 15\nfirst_message = 10\n",
    )
    .unwrap();
    let config = SearchConfig::from_file(&path).unwrap();

    let forum = create_forum();
    populate_ranking_forum(&forum);
    let ranked = relevances(&forum, config);

    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].0, 1);
    assert_eq!(ranked[1].0, 2);
    assert!(ranked[0].1 > ranked[1].1);
}

#[test]
fn tier2_default_config_file_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(boardsearch::CONFIG_FILE_NAME);
    SearchConfig::write_default_if_missing(&path).unwrap();

    let config = SearchConfig::from_file(&path).unwrap();

    assert_eq!(config, SearchConfig::default());
}

#[test]
fn tier2_zero_sum_weights_rank_like_defaults() {
    let forum = create_forum();
    populate_ranking_forum(&forum);
    let zero = SearchConfig::from_toml_str(
        "[weights]\nfrequency = 0\nage = 0\nlength = 0\nsubject = 0\nfirst_message = 0\n",
    )
    .unwrap();

    let fallback = relevances(&forum, zero);
    let defaults = relevances(&forum, SearchConfig::default());

    assert_eq!(fallback, defaults);
    assert!(fallback.iter().all(|(_, relevance)| *relevance > 0));
}

#[test]
fn tier2_sticky_weight_lifts_sticky_topics() {
    let forum = create_forum();
    forum.insert_message(Message::new(1, 1, 1, "Old elk", "pinned").with_posted_at(NOW - 300 * DAY));
    forum.insert_message(Message::new(2, 2, 1, "New elk", "fresh").with_posted_at(NOW));
    forum.set_sticky(TopicId(1), true);
    let config = SearchConfig::from_toml_str("[weights]\nsticky = 100\n").unwrap();

    let ranked = relevances(&forum, config);

    assert_eq!(ranked, vec![(1, 1000), (2, 0)]);
}

#[test]
fn tier2_sort_by_replies_ascending() {
    let forum = create_forum();
    for (topic, replies) in [(1u64, 10u32), (2, 0), (3, 5)] {
        forum.insert_message(Message::new(topic, topic, 1, "elk", "body").with_posted_at(NOW));
        forum.set_num_replies(TopicId(topic), replies);
    }
    let engine = create_engine(&forum, SearchConfig::default());
    let mut session = SearchSession::new("t2");
    let request = SearchRequest::form([
        ("search", "elk"),
        ("sort", "num_replies"),
        ("sort_dir", "asc"),
    ]);

    let page = engine.search(&mut session, &guest(), &request).unwrap();

    let replies: Vec<u32> = page.results.map(|m| m.num_replies).collect();
    assert_eq!(replies, vec![0, 5, 10]);
}
