//! Test utilities for the search flow suite

use boardsearch::limits::SECONDS_PER_DAY;
use boardsearch::{
    BbcRenderer, Caller, ForumServices, MemoryForum, Message, SearchConfig, SearchEngine,
    SearchRequest, WordCensor,
};
use std::sync::Arc;

/// Fixed "now" used for posting times, well after the epoch
pub const NOW: i64 = 3_000 * SECONDS_PER_DAY;

/// One day in seconds
pub const DAY: i64 = SECONDS_PER_DAY;

/// Route engine logs to the test writer; safe to call from every test
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .try_init();
}

/// Forum with one public board and one member
pub fn create_forum() -> Arc<MemoryForum> {
    let forum = Arc::new(MemoryForum::new());
    forum.add_board(1, "General", 1, "Main");
    forum.add_member(7, "alice");
    forum
}

/// Wire the in-memory forum into collaborator services
pub fn services(forum: &Arc<MemoryForum>) -> ForumServices {
    ForumServices {
        store: forum.clone(),
        members: forum.clone(),
        boards: forum.clone(),
        permissions: forum.clone(),
        censor: Arc::new(WordCensor::new(&["darn"])),
        renderer: Arc::new(BbcRenderer),
    }
}

/// Engine with the standard backend only
pub fn create_engine(forum: &Arc<MemoryForum>, config: SearchConfig) -> SearchEngine {
    init_logging();
    SearchEngine::builder(config, services(forum))
        .build()
        .expect("engine should build")
}

/// Populate `count` single-message topics mentioning elk, newest first
pub fn populate_elk_topics(forum: &MemoryForum, count: u64) {
    for i in 1..=count {
        forum.insert_message(
            Message::new(i, i, 1, format!("Topic {}", i), "An elk walked by")
                .with_posted_at(NOW - i as i64 * 3_600),
        );
    }
}

/// Guest caller
pub fn guest() -> Caller {
    Caller::guest("198.51.100.4")
}

/// Fresh form search for `text`
pub fn query(text: &str) -> SearchRequest {
    SearchRequest::form([("search", text)])
}
