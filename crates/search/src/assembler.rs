//! Per-page result assembly
//!
//! [`ResultAssembler::assemble`] batch-loads everything a page needs up
//! front (messages, topics, boards, posters) and returns [`MatchedMessages`],
//! a forward-only sequence that censors, renders, windows and highlights one
//! message per step. `reset()` restarts it from the first row.
//!
//! Rows whose message no longer exists are skipped.

use crate::collaborators::ForumServices;
use crate::highlight::{strip_tags, Highlighter};
use crate::markup::escape_html;
use crate::scoring::ResultRow;
use crate::tokenizer::decode_entities;
use boardsearch_core::{
    Board, BoardId, Caller, Member, MemberId, Message, MessageId, Result, TokenSet, Topic, TopicId,
};
use std::collections::HashMap;
use tracing::warn;

// ============================================================================
// MatchedMessage
// ============================================================================

/// One assembled search result
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedMessage {
    /// 1-based position in the whole result set
    pub rank: usize,
    /// Message shown
    pub message_id: MessageId,
    /// Its topic
    pub topic_id: TopicId,
    /// Board and category, when the board is known
    pub board: Option<Board>,
    /// Poster id, `None` for guests
    pub poster_id: Option<MemberId>,
    /// Poster display name
    pub poster_name: String,
    /// Censored, escaped and highlighted subject
    pub subject: String,
    /// Censored, rendered (or compacted) and highlighted body
    pub body: String,
    /// Posting time, epoch seconds
    pub posted_at: i64,
    /// Relevance score of the row
    pub relevance: u32,
    /// Matching messages in the topic
    pub num_matches: u32,
    /// Topic reply count
    pub num_replies: u32,
    /// Pinned topic
    pub is_sticky: bool,
    /// Locked topic
    pub is_locked: bool,
    /// Whether the caller may see attachments of this message
    pub can_view_attachments: bool,
    best_relevance: u32,
}

impl MatchedMessage {
    /// Relevance as a percentage of the best row of the result set
    pub fn relevance_percent(&self) -> u32 {
        if self.best_relevance == 0 {
            return 0;
        }
        let percent = (self.relevance as f64 * 100.0 / self.best_relevance as f64).round();
        (percent as u32).min(100)
    }
}

// ============================================================================
// ResultAssembler
// ============================================================================

/// Builds [`MatchedMessages`] from ranked rows
#[derive(Clone)]
pub struct ResultAssembler {
    services: ForumServices,
    highlighter: Highlighter,
}

impl ResultAssembler {
    /// Create an assembler
    pub fn new(services: ForumServices, highlighter: Highlighter) -> Self {
        ResultAssembler {
            services,
            highlighter,
        }
    }

    /// Load the context of `rows` and return the lazy page sequence
    ///
    /// # Errors
    ///
    /// Propagates collaborator failures from the batch loads.
    pub fn assemble(
        &self,
        caller: &Caller,
        rows: Vec<ResultRow>,
        tokens: &TokenSet,
        compact: bool,
    ) -> Result<MatchedMessages> {
        let message_ids: Vec<MessageId> = rows.iter().map(|r| r.message_id).collect();
        let messages: HashMap<MessageId, Message> = self
            .services
            .store
            .messages(&message_ids)?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        let dangling = rows.iter().filter(|r| !messages.contains_key(&r.message_id)).count();
        if dangling > 0 {
            warn!(target: "boardsearch::engine", dangling, "Cached results refer to deleted messages; omitting them");
        }

        let mut topic_ids: Vec<TopicId> = messages.values().map(|m| m.topic_id).collect();
        topic_ids.sort_unstable();
        topic_ids.dedup();
        let topics: HashMap<TopicId, Topic> = self
            .services
            .store
            .topics(&topic_ids)?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        let mut member_ids: Vec<MemberId> = messages.values().filter_map(|m| m.poster_id).collect();
        member_ids.sort_unstable();
        member_ids.dedup();
        let members: HashMap<MemberId, Member> = self
            .services
            .members
            .members(&member_ids)?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        let boards: HashMap<BoardId, Board> = self
            .services
            .boards
            .boards()?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();

        Ok(MatchedMessages {
            rows,
            position: 0,
            first_rank: 1,
            best_relevance: 0,
            messages,
            topics,
            members,
            boards,
            terms: tokens.highlight_terms().into_iter().map(String::from).collect(),
            compact,
            caller: caller.clone(),
            services: self.services.clone(),
            highlighter: self.highlighter.clone(),
        })
    }
}

// ============================================================================
// MatchedMessages
// ============================================================================

/// Finite, forward-only sequence of assembled results
pub struct MatchedMessages {
    rows: Vec<ResultRow>,
    position: usize,
    first_rank: usize,
    best_relevance: u32,
    messages: HashMap<MessageId, Message>,
    topics: HashMap<TopicId, Topic>,
    members: HashMap<MemberId, Member>,
    boards: HashMap<BoardId, Board>,
    terms: Vec<String>,
    compact: bool,
    caller: Caller,
    services: ForumServices,
    highlighter: Highlighter,
}

impl std::fmt::Debug for MatchedMessages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchedMessages")
            .field("rows", &self.rows)
            .field("position", &self.position)
            .field("first_rank", &self.first_rank)
            .field("best_relevance", &self.best_relevance)
            .field("terms", &self.terms)
            .field("compact", &self.compact)
            .finish_non_exhaustive()
    }
}

impl MatchedMessages {
    /// An empty sequence
    pub fn empty(services: ForumServices, highlighter: Highlighter) -> Self {
        MatchedMessages {
            rows: Vec::new(),
            position: 0,
            first_rank: 1,
            best_relevance: 0,
            messages: HashMap::new(),
            topics: HashMap::new(),
            members: HashMap::new(),
            boards: HashMap::new(),
            terms: Vec::new(),
            compact: false,
            caller: Caller::default(),
            services,
            highlighter,
        }
    }

    /// Builder: rank of the first row (1-based)
    pub fn starting_at(mut self, rank: usize) -> Self {
        self.first_rank = rank.max(1);
        self
    }

    /// Builder: best relevance of the whole set, for percentages
    pub fn relative_to(mut self, best_relevance: u32) -> Self {
        self.best_relevance = best_relevance;
        self
    }

    /// Restart from the first row
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Rows on this page, including any that will be skipped as dangling
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn build(&self, index: usize, row: &ResultRow, message: &Message) -> MatchedMessage {
        let terms: Vec<&str> = self.terms.iter().map(String::as_str).collect();
        let topic = self.topics.get(&message.topic_id);

        let subject = self.services.censor.censor(&message.subject);
        let subject = self.highlighter.highlight(&escape_html(&subject), &terms);

        let body = self.services.censor.censor(&message.body);
        let rendered = self.services.renderer.render(&body, message.smileys_enabled);
        let body = if self.compact {
            let plain = decode_entities(&strip_tags(&rendered));
            escape_html(&self.highlighter.compact(&plain, &terms))
        } else {
            rendered
        };
        let body = self.highlighter.highlight(&body, &terms);

        let poster_name = message
            .poster_id
            .and_then(|id| self.members.get(&id))
            .map(|m| m.display_name.clone())
            .unwrap_or_else(|| message.poster_name.clone());

        MatchedMessage {
            rank: self.first_rank.saturating_add(index),
            message_id: message.id,
            topic_id: message.topic_id,
            board: self.boards.get(&message.board_id).cloned(),
            poster_id: message.poster_id,
            poster_name,
            subject,
            body,
            posted_at: message.posted_at,
            relevance: row.relevance,
            num_matches: row.num_matches,
            num_replies: topic.map(|t| t.num_replies).unwrap_or(row.num_replies),
            is_sticky: topic.is_some_and(|t| t.is_sticky),
            is_locked: topic.is_some_and(|t| t.is_locked),
            can_view_attachments: self
                .services
                .permissions
                .can_view_attachments(&self.caller, message.board_id),
            best_relevance: self.best_relevance,
        }
    }
}

impl Iterator for MatchedMessages {
    type Item = MatchedMessage;

    fn next(&mut self) -> Option<Self::Item> {
        while self.position < self.rows.len() {
            let index = self.position;
            self.position += 1;
            let row = &self.rows[index];
            if let Some(message) = self.messages.get(&row.message_id) {
                return Some(self.build(index, row, message));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.rows.len() - self.position))
    }
}
