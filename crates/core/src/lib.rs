//! Core types for boardsearch
//!
//! This crate defines the foundational types used throughout the system:
//! - Ids and forum records: MessageId, TopicId, BoardId, Message, Topic, Board, Member
//! - SearchParams: the canonical, encodable description of one search
//! - TokenSet: required / excluded / ignored terms of a query
//! - SearchError: error taxonomy with stable codes
//! - Limits: hard bounds of the search contract

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod error;
pub mod limits;
pub mod params;
pub mod tokens;
pub mod types;

// Re-export commonly used types
pub use error::{ErrorCategory, Result, SearchError};
pub use params::{SearchParams, SortDirection, SortKey, UserFilter};
pub use tokens::{Term, TokenSet};
pub use types::{
    Board, BoardId, Caller, CategoryId, Member, MemberId, Message, MessageId, Topic, TopicId,
};
