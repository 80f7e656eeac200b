//! Tier 4: Rendering
//!
//! What a result page shows: censored, escaped, highlighted subjects and
//! bodies, optionally reduced to excerpts around each match.

use crate::test_utils::*;
use boardsearch::{Message, SearchConfig, SearchRequest, SearchSession};

fn full_body(text: &str) -> SearchRequest {
    SearchRequest::form([("search", text), ("compact", "0")])
}

#[test]
fn tier4_compact_body_has_one_excerpt_per_distant_match() {
    let forum = create_forum();
    let filler = "pellentesque habitant morbi tristique senectus ".repeat(4);
    forum.insert_message(Message::new(
        1,
        1,
        1,
        "Field notes",
        format!("elk at dawn. {filler} elk at noon. {filler} elk at dusk."),
    ));
    let mut config = SearchConfig::default();
    config.ellipsis = " [...] ".to_string();
    config.compact_radius = 20;
    let engine = create_engine(&forum, config);
    let mut session = SearchSession::new("t4");

    let page = engine.search(&mut session, &guest(), &query("elk")).unwrap();
    let body = page.results.map(|m| m.body).next().unwrap();

    assert_eq!(body.split(" [...] ").count(), 3);
    assert_eq!(body.matches("<strong class=\"highlight\">elk</strong>").count(), 3);
    assert!(!body.contains("senectus pellentesque habitant morbi tristique senectus"));
}

#[test]
fn tier4_highlight_skips_markup() {
    let forum = create_forum();
    forum.insert_message(Message::new(
        1,
        1,
        1,
        "Links",
        "[url=https://elk.example.org]elk gallery[/url]",
    ));
    let engine = create_engine(&forum, SearchConfig::default());
    let mut session = SearchSession::new("t4");

    let page = engine.search(&mut session, &guest(), &full_body("elk")).unwrap();
    let body = page.results.map(|m| m.body).next().unwrap();

    assert_eq!(
        body,
        "<a href=\"https://elk.example.org\"><strong class=\"highlight\">elk</strong> gallery</a>"
    );
}

#[test]
fn tier4_subject_is_escaped_then_highlighted() {
    let forum = create_forum();
    forum.insert_message(Message::new(1, 1, 1, "<b>Elk</b> & co", "body"));
    let engine = create_engine(&forum, SearchConfig::default());
    let mut session = SearchSession::new("t4");

    let page = engine.search(&mut session, &guest(), &query("elk")).unwrap();
    let subject = page.results.map(|m| m.subject).next().unwrap();

    assert_eq!(
        subject,
        "&lt;b&gt;<strong class=\"highlight\">Elk</strong>&lt;/b&gt; &amp; co"
    );
}

#[test]
fn tier4_entities_survive_highlighting() {
    let forum = create_forum();
    forum.insert_message(Message::new(1, 1, 1, "Tone & amp", "Guitar amp & pedal board"));
    let engine = create_engine(&forum, SearchConfig::default());
    let mut session = SearchSession::new("t4");

    let page = engine.search(&mut session, &guest(), &full_body("amp")).unwrap();
    let mut results = page.results;
    let hit = results.next().unwrap();

    assert_eq!(
        hit.body,
        "Guitar <strong class=\"highlight\">amp</strong> &amp; pedal board"
    );
    assert_eq!(
        hit.subject,
        "Tone &amp; <strong class=\"highlight\">amp</strong>"
    );
}

#[test]
fn tier4_censored_words_are_masked() {
    let forum = create_forum();
    forum.insert_message(Message::new(1, 1, 1, "Darn elk", "that darn elk again"));
    let engine = create_engine(&forum, SearchConfig::default());
    let mut session = SearchSession::new("t4");

    let page = engine.search(&mut session, &guest(), &full_body("elk")).unwrap();
    let mut results = page.results;
    let hit = results.next().unwrap();

    assert!(hit.subject.starts_with("**** "));
    assert!(!hit.body.to_lowercase().contains("darn"));
    assert!(hit.body.contains("<strong class=\"highlight\">elk</strong>"));
}

#[test]
fn tier4_phrase_highlighted_as_a_whole() {
    let forum = create_forum();
    forum.insert_message(Message::new(1, 1, 1, "Changelog", "notes on the next release"));
    forum.insert_message(Message::new(2, 2, 1, "Changelog", "see the release notes below"));
    let engine = create_engine(&forum, SearchConfig::default());
    let mut session = SearchSession::new("t4");

    let page = engine
        .search(&mut session, &guest(), &full_body("\"release notes\""))
        .unwrap();
    assert_eq!(page.total, 1);
    let body = page.results.map(|m| m.body).next().unwrap();

    assert_eq!(
        body,
        "see the <strong class=\"highlight\">release notes</strong> below"
    );
}
