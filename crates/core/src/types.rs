//! Core forum types for boardsearch
//!
//! This module defines the identifiers and plain records the search engine
//! exchanges with its collaborators:
//! - MessageId / TopicId / BoardId / CategoryId / MemberId: integer handles
//! - Message / Topic / Board / Member: rows as returned by the forum store
//! - Caller: the identity a search runs on behalf of
//!
//! None of these types own storage. The engine only reads them.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl $name {
            /// Get the raw integer value
            pub fn get(&self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a single posted message
    ///
    /// Message ids are assigned in posting order, so a larger id is a newer
    /// message. Ranking uses this for recency tie-breaks.
    MessageId
);
id_type!(
    /// Identifier of a topic (thread)
    TopicId
);
id_type!(
    /// Identifier of a board
    BoardId
);
id_type!(
    /// Identifier of a board category
    CategoryId
);
id_type!(
    /// Identifier of a registered member
    MemberId
);

/// A single message row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message id
    pub id: MessageId,
    /// Owning topic
    pub topic_id: TopicId,
    /// Board the topic lives in
    pub board_id: BoardId,
    /// Poster, `None` for guest posts
    pub poster_id: Option<MemberId>,
    /// Display name stored with the message
    pub poster_name: String,
    /// Subject line
    pub subject: String,
    /// Raw (unrendered) body markup
    pub body: String,
    /// Posting time, seconds since the Unix epoch
    pub posted_at: i64,
    /// Like count
    pub likes: u32,
    /// Whether smileys should be rendered for this message
    pub smileys_enabled: bool,
}

impl Message {
    /// Create a message with the given identity and text
    ///
    /// Remaining fields take neutral defaults and can be set directly.
    pub fn new(
        id: u64,
        topic_id: u64,
        board_id: u64,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Message {
            id: MessageId(id),
            topic_id: TopicId(topic_id),
            board_id: BoardId(board_id),
            poster_id: None,
            poster_name: String::new(),
            subject: subject.into(),
            body: body.into(),
            posted_at: 0,
            likes: 0,
            smileys_enabled: true,
        }
    }

    /// Builder: set poster
    pub fn with_poster(mut self, id: Option<MemberId>, name: impl Into<String>) -> Self {
        self.poster_id = id;
        self.poster_name = name.into();
        self
    }

    /// Builder: set posting time
    pub fn with_posted_at(mut self, posted_at: i64) -> Self {
        self.posted_at = posted_at;
        self
    }

    /// Builder: set like count
    pub fn with_likes(mut self, likes: u32) -> Self {
        self.likes = likes;
        self
    }
}

/// A topic row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Topic id
    pub id: TopicId,
    /// Board the topic lives in
    pub board_id: BoardId,
    /// Opening post
    pub first_message_id: MessageId,
    /// Most recent post
    pub last_message_id: MessageId,
    /// Number of replies (messages minus the opening post)
    pub num_replies: u32,
    /// Pinned topic
    pub is_sticky: bool,
    /// Locked topic
    pub is_locked: bool,
}

/// A board row, including its category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Board id
    pub id: BoardId,
    /// Board display name
    pub name: String,
    /// Category id
    pub category_id: CategoryId,
    /// Category display name
    pub category_name: String,
}

/// A registered member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Member id
    pub id: MemberId,
    /// Login / real name used for lookups
    pub name: String,
    /// Name shown next to posts
    pub display_name: String,
}

/// Identity a search is performed for
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Caller {
    /// Member id, `None` for guests
    pub member_id: Option<MemberId>,
    /// Client address, used by flood protection
    pub ip: String,
}

impl Caller {
    /// Guest caller
    pub fn guest(ip: impl Into<String>) -> Self {
        Caller {
            member_id: None,
            ip: ip.into(),
        }
    }

    /// Logged-in member caller
    pub fn member(id: u64, ip: impl Into<String>) -> Self {
        Caller {
            member_id: Some(MemberId(id)),
            ip: ip.into(),
        }
    }

    /// True when not logged in
    pub fn is_guest(&self) -> bool {
        self.member_id.is_none()
    }
}
