//! In-memory forum collaborators
//!
//! [`MemoryForum`] implements the storage-side collaborator traits over
//! plain maps. It backs the test suites and is usable for embedding the
//! engine in small tools. [`MemoryWordIndex`] is a word → message map built
//! from a forum snapshot.
//!
//! # Thread Safety
//!
//! All state sits behind `parking_lot::RwLock`; readers never block each
//! other.

use crate::collaborators::{
    BoardDirectory, MemberDirectory, MessageStore, Permissions, ScanFilter, WordIndex,
};
use boardsearch_core::{
    Board, BoardId, Caller, CategoryId, Member, MemberId, Message, MessageId, Result, Topic,
    TopicId,
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use unicode_segmentation::UnicodeSegmentation;

#[derive(Default)]
struct ForumData {
    messages: BTreeMap<MessageId, Message>,
    topics: BTreeMap<TopicId, Topic>,
    boards: BTreeMap<BoardId, Board>,
    members: BTreeMap<MemberId, Member>,
    // Per-caller board visibility; callers not listed see every board
    visibility: HashMap<Option<MemberId>, Vec<BoardId>>,
}

/// In-memory forum
#[derive(Default)]
pub struct MemoryForum {
    data: RwLock<ForumData>,
}

impl MemoryForum {
    /// Create an empty forum
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a board
    pub fn add_board(&self, id: u64, name: &str, category_id: u64, category_name: &str) {
        self.data.write().boards.insert(
            BoardId(id),
            Board {
                id: BoardId(id),
                name: name.to_string(),
                category_id: CategoryId(category_id),
                category_name: category_name.to_string(),
            },
        );
    }

    /// Add or replace a member
    pub fn add_member(&self, id: u64, name: &str) {
        self.data.write().members.insert(
            MemberId(id),
            Member {
                id: MemberId(id),
                name: name.to_string(),
                display_name: name.to_string(),
            },
        );
    }

    /// Insert a message, creating or updating its topic
    ///
    /// The topic's first/last message and reply count follow the messages
    /// inserted so far.
    pub fn insert_message(&self, message: Message) {
        let mut data = self.data.write();
        let topic_id = message.topic_id;
        let board_id = message.board_id;
        data.messages.insert(message.id, message);
        Self::refresh_topic(&mut data, topic_id, board_id);
    }

    /// Delete a message, leaving its topic row in place
    pub fn remove_message(&self, id: MessageId) -> Option<Message> {
        self.data.write().messages.remove(&id)
    }

    /// Pin or unpin a topic
    pub fn set_sticky(&self, topic: TopicId, sticky: bool) {
        if let Some(t) = self.data.write().topics.get_mut(&topic) {
            t.is_sticky = sticky;
        }
    }

    /// Override a topic's reply count
    ///
    /// Lets tests model large topics without inserting every reply.
    pub fn set_num_replies(&self, topic: TopicId, num_replies: u32) {
        if let Some(t) = self.data.write().topics.get_mut(&topic) {
            t.num_replies = num_replies;
        }
    }

    /// Restrict the boards a caller can see
    pub fn restrict_boards(&self, member: Option<MemberId>, boards: Vec<BoardId>) {
        self.data.write().visibility.insert(member, boards);
    }

    /// Number of stored messages
    pub fn message_count(&self) -> usize {
        self.data.read().messages.len()
    }

    fn refresh_topic(data: &mut ForumData, topic_id: TopicId, board_id: BoardId) {
        let ids: Vec<MessageId> = data
            .messages
            .values()
            .filter(|m| m.topic_id == topic_id)
            .map(|m| m.id)
            .collect();
        let (Some(first), Some(last)) = (ids.first().copied(), ids.last().copied()) else {
            return;
        };
        let num_replies = ids.len().saturating_sub(1) as u32;
        let topic = data.topics.entry(topic_id).or_insert(Topic {
            id: topic_id,
            board_id,
            first_message_id: first,
            last_message_id: last,
            num_replies,
            is_sticky: false,
            is_locked: false,
        });
        topic.first_message_id = first;
        topic.last_message_id = last;
        topic.num_replies = num_replies;
    }
}

impl MessageStore for MemoryForum {
    fn messages(&self, ids: &[MessageId]) -> Result<Vec<Message>> {
        let data = self.data.read();
        Ok(ids
            .iter()
            .filter_map(|id| data.messages.get(id).cloned())
            .collect())
    }

    fn topics(&self, ids: &[TopicId]) -> Result<Vec<Topic>> {
        let data = self.data.read();
        Ok(ids
            .iter()
            .filter_map(|id| data.topics.get(id).cloned())
            .collect())
    }

    fn scan(&self, filter: &ScanFilter) -> Result<Vec<Message>> {
        let data = self.data.read();
        Ok(data
            .messages
            .values()
            .filter(|m| filter.accepts(m))
            .cloned()
            .collect())
    }

    fn latest_post_time(&self) -> Result<Option<i64>> {
        Ok(self.data.read().messages.values().map(|m| m.posted_at).max())
    }
}

impl MemberDirectory for MemoryForum {
    fn members(&self, ids: &[MemberId]) -> Result<Vec<Member>> {
        let data = self.data.read();
        Ok(ids
            .iter()
            .filter_map(|id| data.members.get(id).cloned())
            .collect())
    }

    fn find_by_names(&self, names: &[String]) -> Result<Vec<Member>> {
        let wanted: HashSet<String> = names.iter().map(|n| n.to_lowercase()).collect();
        let data = self.data.read();
        Ok(data
            .members
            .values()
            .filter(|m| {
                wanted.contains(&m.name.to_lowercase())
                    || wanted.contains(&m.display_name.to_lowercase())
            })
            .cloned()
            .collect())
    }
}

impl BoardDirectory for MemoryForum {
    fn boards(&self) -> Result<Vec<Board>> {
        Ok(self.data.read().boards.values().cloned().collect())
    }
}

impl Permissions for MemoryForum {
    fn visible_boards(&self, caller: &Caller) -> Result<Vec<BoardId>> {
        let data = self.data.read();
        Ok(match data.visibility.get(&caller.member_id) {
            Some(boards) => boards.clone(),
            None => data.boards.keys().copied().collect(),
        })
    }

    fn can_view_attachments(&self, caller: &Caller, _board: BoardId) -> bool {
        !caller.is_guest()
    }
}

/// Word → message map built from a forum snapshot
pub struct MemoryWordIndex {
    words: HashMap<String, Vec<MessageId>>,
    ready: bool,
}

impl MemoryWordIndex {
    /// Index the subject and body of every message currently in `forum`
    pub fn build(forum: &MemoryForum) -> Self {
        let mut words: HashMap<String, Vec<MessageId>> = HashMap::new();
        for message in forum.data.read().messages.values() {
            let mut seen = HashSet::new();
            let text = format!("{} {}", message.subject, message.body);
            for word in text.unicode_words() {
                let word = word.to_lowercase();
                if seen.insert(word.clone()) {
                    words.entry(word).or_default().push(message.id);
                }
            }
        }
        MemoryWordIndex { words, ready: true }
    }

    /// An index that reports itself as not built yet
    pub fn unavailable() -> Self {
        MemoryWordIndex {
            words: HashMap::new(),
            ready: false,
        }
    }
}

impl WordIndex for MemoryWordIndex {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn messages_with_word(&self, word: &str) -> Result<Vec<MessageId>> {
        Ok(self.words.get(word).cloned().unwrap_or_default())
    }
}
