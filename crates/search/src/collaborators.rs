//! Services the search engine consumes but does not implement
//!
//! The forum's storage, member and board directories, permission system,
//! censor and markup renderer are external. Each is reached through a narrow
//! trait returning plain data; [`ForumServices`] bundles them for the engine.
//!
//! In-memory implementations for tests and embedding live in
//! [`crate::memory`] and [`crate::markup`].

use boardsearch_core::{
    Board, BoardId, Caller, Member, MemberId, Message, MessageId, Result, Topic, TopicId,
};
use std::sync::Arc;

// ============================================================================
// ScanFilter
// ============================================================================

/// Poster restriction resolved from a user filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PosterFilter {
    /// Registered members
    pub member_ids: Vec<MemberId>,
    /// Stored poster names (lowercase), for guest posts and unknown names
    pub names: Vec<String>,
}

impl PosterFilter {
    /// Whether a message passes this filter
    pub fn accepts(&self, message: &Message) -> bool {
        if let Some(id) = message.poster_id {
            if self.member_ids.contains(&id) {
                return true;
            }
        }
        let name = message.poster_name.to_lowercase();
        self.names.iter().any(|n| *n == name)
    }
}

/// Structural filter applied when enumerating candidate messages
///
/// `None` fields do not restrict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanFilter {
    /// Boards to search
    pub boards: Option<Vec<BoardId>>,
    /// Single topic
    pub topic: Option<TopicId>,
    /// Poster restriction
    pub posters: Option<PosterFilter>,
    /// Oldest accepted posting time (inclusive, epoch seconds)
    pub posted_after: Option<i64>,
    /// Newest accepted posting time (inclusive, epoch seconds)
    pub posted_before: Option<i64>,
    /// Restrict to these messages
    pub message_ids: Option<Vec<MessageId>>,
}

impl ScanFilter {
    /// Whether a message passes every structural restriction
    pub fn accepts(&self, message: &Message) -> bool {
        if let Some(boards) = &self.boards {
            if !boards.contains(&message.board_id) {
                return false;
            }
        }
        if let Some(topic) = self.topic {
            if message.topic_id != topic {
                return false;
            }
        }
        if let Some(posters) = &self.posters {
            if !posters.accepts(message) {
                return false;
            }
        }
        if let Some(after) = self.posted_after {
            if message.posted_at < after {
                return false;
            }
        }
        if let Some(before) = self.posted_before {
            if message.posted_at > before {
                return false;
            }
        }
        if let Some(ids) = &self.message_ids {
            if !ids.contains(&message.id) {
                return false;
            }
        }
        true
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Read access to messages and topics
pub trait MessageStore: Send + Sync {
    /// Messages by id; missing ids are silently absent from the result
    fn messages(&self, ids: &[MessageId]) -> Result<Vec<Message>>;

    /// Topics by id; missing ids are silently absent from the result
    fn topics(&self, ids: &[TopicId]) -> Result<Vec<Topic>>;

    /// Every message passing the filter
    fn scan(&self, filter: &ScanFilter) -> Result<Vec<Message>>;

    /// Posting time of the newest message in the archive
    fn latest_post_time(&self) -> Result<Option<i64>>;
}

/// Member lookups
pub trait MemberDirectory: Send + Sync {
    /// Members by id
    fn members(&self, ids: &[MemberId]) -> Result<Vec<Member>>;

    /// Members whose name matches one of `names` (case-insensitive)
    fn find_by_names(&self, names: &[String]) -> Result<Vec<Member>>;
}

/// Board and category metadata
pub trait BoardDirectory: Send + Sync {
    /// All boards
    fn boards(&self) -> Result<Vec<Board>>;
}

/// Access control
pub trait Permissions: Send + Sync {
    /// Boards the caller may search
    fn visible_boards(&self, caller: &Caller) -> Result<Vec<BoardId>>;

    /// Whether the caller may see attachments on a board
    fn can_view_attachments(&self, caller: &Caller, board: BoardId) -> bool;
}

/// Content censorship
pub trait Censor: Send + Sync {
    /// Return `text` with censored words replaced
    fn censor(&self, text: &str) -> String;
}

/// Markup to display HTML
pub trait MarkupRenderer: Send + Sync {
    /// Render a message body
    fn render(&self, body: &str, smileys: bool) -> String;
}

/// Word → message index maintained outside this crate
pub trait WordIndex: Send + Sync {
    /// Whether the index is built and usable
    fn is_ready(&self) -> bool;

    /// Messages whose subject or body contains `word` (lowercase)
    fn messages_with_word(&self, word: &str) -> Result<Vec<MessageId>>;
}

// ============================================================================
// ForumServices
// ============================================================================

/// Bundle of collaborators handed to the engine and assembler
#[derive(Clone)]
pub struct ForumServices {
    /// Message and topic rows
    pub store: Arc<dyn MessageStore>,
    /// Member lookups
    pub members: Arc<dyn MemberDirectory>,
    /// Board metadata
    pub boards: Arc<dyn BoardDirectory>,
    /// Access control
    pub permissions: Arc<dyn Permissions>,
    /// Censorship
    pub censor: Arc<dyn Censor>,
    /// Markup rendering
    pub renderer: Arc<dyn MarkupRenderer>,
}
