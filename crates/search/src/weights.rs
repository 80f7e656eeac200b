//! Ranking factor weights
//!
//! A [`WeightProfile`] is built once from configuration and shared read-only
//! by every request. A profile whose weights sum to zero would rank every
//! topic equally, so it is replaced wholesale by [`WeightProfile::fallback`]
//! and the misconfiguration is logged for the operator.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, warn};

/// A scoring factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Factor {
    /// Matching messages relative to topic size
    Frequency,
    /// Recency of the newest matching message
    Age,
    /// Topic size, capped
    Length,
    /// Match in the subject line
    Subject,
    /// Earliest match is the opening post
    FirstMessage,
    /// Pinned topic
    Sticky,
    /// Like count
    Likes,
}

impl Factor {
    /// All factors in a fixed order
    pub const ALL: [Factor; 7] = [
        Factor::Frequency,
        Factor::Age,
        Factor::Length,
        Factor::Subject,
        Factor::FirstMessage,
        Factor::Sticky,
        Factor::Likes,
    ];

    /// Configuration name
    pub fn name(&self) -> &'static str {
        match self {
            Factor::Frequency => "frequency",
            Factor::Age => "age",
            Factor::Length => "length",
            Factor::Subject => "subject",
            Factor::FirstMessage => "first_message",
            Factor::Sticky => "sticky",
            Factor::Likes => "likes",
        }
    }

    /// Parse a configuration name
    pub fn parse(name: &str) -> Option<Self> {
        Factor::ALL.into_iter().find(|f| f.name() == name)
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Relative weight of each ranking factor, 0-100 each
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightProfile {
    weights: [u32; 7],
    total: u32,
    fallback: bool,
}

impl WeightProfile {
    /// Upper bound of a single weight
    pub const MAX_WEIGHT: u32 = 100;

    /// Built-in profile used when the configured weights sum to zero
    pub fn fallback() -> Self {
        let mut profile = Self::zeroed();
        profile.set(Factor::Frequency, 30);
        profile.set(Factor::Age, 25);
        profile.set(Factor::Length, 20);
        profile.set(Factor::Subject, 15);
        profile.set(Factor::FirstMessage, 10);
        profile.fallback = true;
        profile
    }

    fn zeroed() -> Self {
        WeightProfile {
            weights: [0; 7],
            total: 0,
            fallback: false,
        }
    }

    fn set(&mut self, factor: Factor, weight: u32) {
        let weight = weight.min(Self::MAX_WEIGHT);
        self.total = self.total - self.weights[factor.index()] + weight;
        self.weights[factor.index()] = weight;
    }

    /// Build a profile from configured `name -> weight` pairs
    ///
    /// Weights are clamped to 0-100; unknown factor names are skipped with a
    /// warning; factors not mentioned weigh zero. A zero total yields the
    /// fallback profile.
    pub fn build<K, I>(configured: I) -> Self
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, i64)>,
    {
        let mut profile = Self::zeroed();
        for (name, weight) in configured {
            let name = name.as_ref();
            match Factor::parse(name) {
                Some(factor) => {
                    let clamped = weight.clamp(0, Self::MAX_WEIGHT as i64) as u32;
                    if clamped as i64 != weight {
                        warn!(
                            target: "boardsearch::weights",
                            factor = name,
                            configured = weight,
                            used = clamped,
                            "Weight out of range, clamped"
                        );
                    }
                    profile.set(factor, clamped);
                }
                None => {
                    warn!(target: "boardsearch::weights", factor = name, "Unknown ranking factor ignored");
                }
            }
        }

        if profile.total == 0 {
            error!(
                target: "boardsearch::weights",
                "Search weights sum to zero; using built-in default weights"
            );
            return Self::fallback();
        }
        profile
    }

    /// Weight of a factor
    pub fn weight(&self, factor: Factor) -> u32 {
        self.weights[factor.index()]
    }

    /// Sum of all weights, never zero
    pub fn total(&self) -> u32 {
        self.total
    }

    /// True when this is the built-in fallback replacing a zero-sum profile
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Factors with a non-zero weight
    pub fn active_factors(&self) -> impl Iterator<Item = Factor> + '_ {
        Factor::ALL.into_iter().filter(|f| self.weight(*f) > 0)
    }
}

impl Default for WeightProfile {
    fn default() -> Self {
        let mut profile = Self::fallback();
        profile.fallback = false;
        profile
    }
}
