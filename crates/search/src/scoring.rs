//! Relevance scoring shared by every enumerating backend
//!
//! This module provides:
//! - MessageHit: one matching message as found by a backend
//! - FactorScores: the normalized value of each ranking factor
//! - RelevanceScorer: aggregates hits per topic and weighs the factors
//! - ResultRow: one ranked hit, the unit stored in the result cache
//! - sort_rows: ordering by the requested sort key
//!
//! Every factor except `likes` is normalized to 0..=1; relevance is
//! `round(1000 * sum(weight * factor) / weight_sum)`.

use crate::config::SearchConfig;
use crate::weights::{Factor, WeightProfile};
use boardsearch_core::limits::SECONDS_PER_DAY;
use boardsearch_core::{MessageId, SortDirection, SortKey, Topic, TopicId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::warn;

// ============================================================================
// ResultRow
// ============================================================================

/// One ranked hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Topic of the hit
    pub topic_id: TopicId,
    /// Representative message shown for the hit
    pub message_id: MessageId,
    /// Weighted relevance, 0-1000 unless likes are weighted
    pub relevance: u32,
    /// Matching messages in the topic
    pub num_matches: u32,
    /// Topic reply count
    pub num_replies: u32,
}

/// Order rows by `key` and `dir`; ties put the newer message first
pub fn sort_rows(rows: &mut [ResultRow], key: SortKey, dir: SortDirection) {
    rows.sort_by(|a, b| {
        let primary = match key {
            SortKey::Relevance => a.relevance.cmp(&b.relevance),
            SortKey::NumReplies => a.num_replies.cmp(&b.num_replies),
            SortKey::Age => a.message_id.cmp(&b.message_id),
        };
        let primary = match dir {
            SortDirection::Asc => primary,
            SortDirection::Desc => primary.reverse(),
        };
        primary.then_with(|| b.message_id.cmp(&a.message_id))
    });
}

// ============================================================================
// MessageHit / FactorScores
// ============================================================================

/// A message that matched every required term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHit {
    /// Matching message
    pub message_id: MessageId,
    /// Its topic
    pub topic_id: TopicId,
    /// Posting time, epoch seconds
    pub posted_at: i64,
    /// Whether the subject line contained the terms
    pub subject_matched: bool,
    /// Like count of the message
    pub likes: u32,
}

/// Value of every ranking factor for one result row
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FactorScores {
    /// Matches relative to topic size
    pub frequency: f64,
    /// Recency on a linear ramp
    pub age: f64,
    /// Topic size, capped at 1
    pub length: f64,
    /// Subject matched
    pub subject: f64,
    /// Earliest match is the opening post
    pub first_message: f64,
    /// Pinned topic
    pub sticky: f64,
    /// Raw like count
    pub likes: f64,
}

impl FactorScores {
    /// Value of one factor
    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Frequency => self.frequency,
            Factor::Age => self.age,
            Factor::Length => self.length,
            Factor::Subject => self.subject,
            Factor::FirstMessage => self.first_message,
            Factor::Sticky => self.sticky,
            Factor::Likes => self.likes,
        }
    }

    /// Weighted relevance under `weights`
    pub fn relevance(&self, weights: &WeightProfile) -> u32 {
        let weighted: f64 = weights
            .active_factors()
            .map(|f| weights.weight(f) as f64 * self.get(f))
            .sum();
        // total() is never zero
        (1000.0 * weighted / weights.total() as f64).round() as u32
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

// ============================================================================
// RelevanceScorer
// ============================================================================

/// Turns message hits into ranked result rows
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    weights: Arc<WeightProfile>,
    ancient_days: u32,
    huge_topic_posts: u32,
}

impl RelevanceScorer {
    /// Create a scorer
    pub fn new(weights: Arc<WeightProfile>, ancient_days: u32, huge_topic_posts: u32) -> Self {
        RelevanceScorer {
            weights,
            ancient_days: ancient_days.max(1),
            huge_topic_posts: huge_topic_posts.max(1),
        }
    }

    /// Scorer using the weights and limits of `config`
    pub fn from_config(config: &SearchConfig) -> Self {
        let weights = WeightProfile::build(config.weights.iter().map(|(k, v)| (k.as_str(), *v)));
        Self::new(Arc::new(weights), config.ancient_days, config.huge_topic_posts)
    }

    /// The weight profile in use
    pub fn weights(&self) -> &WeightProfile {
        &self.weights
    }

    /// Age factor of a posting time relative to the newest indexed message
    pub fn age_factor(&self, posted_at: i64, newest: i64) -> f64 {
        let span = self.ancient_days as i64 * SECONDS_PER_DAY;
        let cutoff = newest - span;
        if posted_at <= cutoff {
            return 0.0;
        }
        ((posted_at - cutoff) as f64 / span as f64).min(1.0)
    }

    /// Length factor of a topic
    pub fn length_factor(&self, num_replies: u32) -> f64 {
        (num_replies as f64 / self.huge_topic_posts as f64).min(1.0)
    }

    /// Score hits into rows
    ///
    /// With `per_message` every hit becomes its own row; otherwise hits are
    /// grouped per topic and the newest matching message represents the
    /// topic. Hits whose topic is missing from `topics` are dropped.
    pub fn score(
        &self,
        hits: Vec<MessageHit>,
        topics: &HashMap<TopicId, Topic>,
        newest: i64,
        per_message: bool,
    ) -> Vec<ResultRow> {
        let mut grouped: BTreeMap<TopicId, Vec<MessageHit>> = BTreeMap::new();
        for hit in hits {
            grouped.entry(hit.topic_id).or_default().push(hit);
        }

        let mut rows = Vec::new();
        for (topic_id, mut topic_hits) in grouped {
            let Some(topic) = topics.get(&topic_id) else {
                warn!(target: "boardsearch::backend", topic = %topic_id, "Matched messages in unknown topic dropped");
                continue;
            };
            topic_hits.sort_by_key(|h| h.message_id);
            let num_matches = topic_hits.len() as u32;
            let frequency = (num_matches as f64 / (topic.num_replies as f64 + 1.0)).min(1.0);
            let length = self.length_factor(topic.num_replies);
            let sticky = flag(topic.is_sticky);

            if per_message {
                for hit in &topic_hits {
                    let scores = FactorScores {
                        frequency,
                        age: self.age_factor(hit.posted_at, newest),
                        length,
                        subject: flag(hit.subject_matched),
                        first_message: flag(hit.message_id == topic.first_message_id),
                        sticky,
                        likes: hit.likes as f64,
                    };
                    rows.push(self.row(topic, hit.message_id, &scores, num_matches));
                }
            } else {
                // Sorted by id, so first is the earliest and last the newest
                let (Some(earliest), Some(newest_hit)) = (topic_hits.first(), topic_hits.last())
                else {
                    continue;
                };
                let newest_time = topic_hits.iter().map(|h| h.posted_at).max().unwrap_or(0);
                let scores = FactorScores {
                    frequency,
                    age: self.age_factor(newest_time, newest),
                    length,
                    subject: flag(topic_hits.iter().any(|h| h.subject_matched)),
                    first_message: flag(earliest.message_id == topic.first_message_id),
                    sticky,
                    likes: topic_hits.iter().map(|h| h.likes as f64).sum(),
                };
                rows.push(self.row(topic, newest_hit.message_id, &scores, num_matches));
            }
        }
        rows
    }

    fn row(
        &self,
        topic: &Topic,
        message_id: MessageId,
        scores: &FactorScores,
        num_matches: u32,
    ) -> ResultRow {
        ResultRow {
            topic_id: topic.id,
            message_id,
            relevance: scores.relevance(&self.weights),
            num_matches,
            num_replies: topic.num_replies,
        }
    }
}
