//! Canonical description of one search
//!
//! [`SearchParams`] is built either from a submitted form (key/value pairs)
//! or from an encoded string carried in a result-page link. Both paths go
//! through [`SearchParams::from_pairs`] and therefore the same validation
//! and defaulting.
//!
//! # Invariants
//!
//! After `from_pairs` / `normalized` succeeds:
//! - `search` is trimmed, non-empty, at most `max_len` characters
//! - `min_age <= max_age <= MAX_AGE_DAYS`
//! - `boards` and `categories` are sorted and free of duplicates
//! - subject-only searches are sorted by relevance or age only

use crate::codec::{decode_pairs, encode_pairs};
use crate::error::{Result, SearchError};
use crate::limits::{MAX_AGE_DAYS, MIN_AGE_DAYS, PARAMS_FORMAT_VERSION};
use crate::types::{BoardId, CategoryId, TopicId};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// SortKey / SortDirection
// ============================================================================

/// Result ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortKey {
    /// Weighted relevance score
    #[default]
    Relevance,
    /// Topic reply count
    NumReplies,
    /// Message age (message id)
    Age,
}

impl SortKey {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Relevance => "relevance",
            SortKey::NumReplies => "num_replies",
            SortKey::Age => "id_msg",
        }
    }

    /// Parse a wire name, `None` when unknown
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "relevance" => Some(SortKey::Relevance),
            "num_replies" => Some(SortKey::NumReplies),
            "id_msg" => Some(SortKey::Age),
            _ => None,
        }
    }

    /// Whether this key is meaningful for subject-only searches
    pub fn allowed_for_subject_only(&self) -> bool {
        matches!(self, SortKey::Relevance | SortKey::Age)
    }
}

/// Ordering direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    /// Smallest first
    Asc,
    /// Largest first
    #[default]
    Desc,
}

impl SortDirection {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Parse a wire name, `None` when unknown
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

// ============================================================================
// UserFilter
// ============================================================================

/// Restriction on who posted the matching messages
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UserFilter {
    /// Any poster
    #[default]
    Anyone,
    /// Posts by one of these names
    Named(Vec<String>),
}

impl UserFilter {
    /// Parse a comma separated user specification
    ///
    /// Names may be double quoted to include commas. Empty input or a bare
    /// `*` means anyone.
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        if spec.is_empty() || spec == "*" {
            return UserFilter::Anyone;
        }

        let mut names: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut quoted = false;
        for c in spec.chars() {
            match c {
                '"' => quoted = !quoted,
                ',' if !quoted => {
                    push_name(&mut names, &current);
                    current.clear();
                }
                _ => current.push(c),
            }
        }
        push_name(&mut names, &current);

        if names.is_empty() || names.iter().any(|n| n == "*") {
            UserFilter::Anyone
        } else {
            UserFilter::Named(names)
        }
    }

    /// Serialize back into a user specification
    pub fn to_spec(&self) -> String {
        match self {
            UserFilter::Anyone => "*".to_string(),
            UserFilter::Named(names) => names
                .iter()
                .map(|n| {
                    if n.contains(',') {
                        format!("\"{}\"", n)
                    } else {
                        n.clone()
                    }
                })
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// True for the wildcard filter
    pub fn is_anyone(&self) -> bool {
        matches!(self, UserFilter::Anyone)
    }
}

fn push_name(names: &mut Vec<String>, raw: &str) {
    let name = raw.trim();
    if !name.is_empty() && !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
        names.push(name.to_string());
    }
}

// ============================================================================
// SearchParams
// ============================================================================

/// Canonical, immutable-per-request description of a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Raw query string as typed
    pub search: String,
    /// Match subjects only
    pub subject_only: bool,
    /// One result per matching message instead of one per topic
    pub show_complete: bool,
    /// Poster restriction
    pub user_filter: UserFilter,
    /// Board restriction (empty = all visible boards)
    pub boards: Vec<BoardId>,
    /// Category restriction (empty = no category restriction)
    pub categories: Vec<CategoryId>,
    /// Restrict to a single topic
    pub topic: Option<TopicId>,
    /// Minimum message age in days
    pub min_age: u32,
    /// Maximum message age in days
    pub max_age: u32,
    /// Ordering
    pub sort: SortKey,
    /// Ordering direction
    pub sort_dir: SortDirection,
    /// Window bodies around matches instead of showing them whole
    pub compact: bool,
}

impl SearchParams {
    /// Create params for a query with every other field at its default
    ///
    /// The result is not validated; call [`SearchParams::normalized`].
    pub fn new(search: impl Into<String>) -> Self {
        SearchParams {
            search: search.into(),
            subject_only: false,
            show_complete: false,
            user_filter: UserFilter::Anyone,
            boards: vec![],
            categories: vec![],
            topic: None,
            min_age: MIN_AGE_DAYS,
            max_age: MAX_AGE_DAYS,
            sort: SortKey::default(),
            sort_dir: SortDirection::default(),
            compact: true,
        }
    }

    /// Builder: subject-only matching
    pub fn with_subject_only(mut self, subject_only: bool) -> Self {
        self.subject_only = subject_only;
        self
    }

    /// Builder: one result per topic
    pub fn with_show_complete(mut self, show_complete: bool) -> Self {
        self.show_complete = show_complete;
        self
    }

    /// Builder: poster restriction
    pub fn with_user_filter(mut self, filter: UserFilter) -> Self {
        self.user_filter = filter;
        self
    }

    /// Builder: board restriction
    pub fn with_boards(mut self, boards: Vec<BoardId>) -> Self {
        self.boards = boards;
        self
    }

    /// Builder: category restriction
    pub fn with_categories(mut self, categories: Vec<CategoryId>) -> Self {
        self.categories = categories;
        self
    }

    /// Builder: single topic restriction
    pub fn with_topic(mut self, topic: TopicId) -> Self {
        self.topic = Some(topic);
        self
    }

    /// Builder: age window in days
    pub fn with_age(mut self, min_age: u32, max_age: u32) -> Self {
        self.min_age = min_age;
        self.max_age = max_age;
        self
    }

    /// Builder: ordering
    pub fn with_sort(mut self, sort: SortKey, dir: SortDirection) -> Self {
        self.sort = sort;
        self.sort_dir = dir;
        self
    }

    /// Builder: compact rendering
    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Validate and apply defaulting rules
    ///
    /// # Errors
    ///
    /// - `EmptyQuery` when the trimmed query is empty
    /// - `QueryTooLong` when it exceeds `max_len` characters
    pub fn normalized(mut self, max_len: usize) -> Result<Self> {
        self.search = self.search.trim().to_string();
        if self.search.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let len = self.search.chars().count();
        if len > max_len {
            return Err(SearchError::QueryTooLong { len, max: max_len });
        }

        self.max_age = self.max_age.min(MAX_AGE_DAYS);
        if self.min_age > self.max_age {
            self.min_age = MIN_AGE_DAYS;
            self.max_age = MAX_AGE_DAYS;
        }

        self.boards.sort_unstable();
        self.boards.dedup();
        self.categories.sort_unstable();
        self.categories.dedup();

        if self.subject_only && !self.sort.allowed_for_subject_only() {
            self.sort = SortKey::Relevance;
        }

        Ok(self)
    }

    /// Build params from submitted key/value pairs
    ///
    /// Unknown keys are ignored. Malformed values fall back to defaults,
    /// except for the query itself which is validated.
    pub fn from_pairs<K, V, I>(pairs: I, max_len: usize) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut params = SearchParams::new(String::new());
        for (key, value) in pairs {
            let value = value.as_ref();
            match key.as_ref() {
                "search" => params.search = value.to_string(),
                "subject_only" => params.subject_only = parse_flag(value),
                "show_complete" => params.show_complete = parse_flag(value),
                "compact" => params.compact = parse_flag(value),
                "userspec" => params.user_filter = UserFilter::parse(value),
                "brd" => params.boards = parse_id_list(value).into_iter().map(BoardId).collect(),
                "c" => {
                    params.categories = parse_id_list(value).into_iter().map(CategoryId).collect()
                }
                "topic" => params.topic = value.trim().parse().ok().map(TopicId),
                "minage" => params.min_age = value.trim().parse().unwrap_or(MIN_AGE_DAYS),
                "maxage" => params.max_age = value.trim().parse().unwrap_or(MAX_AGE_DAYS),
                "sort" => params.sort = SortKey::parse(value.trim()).unwrap_or_default(),
                "sort_dir" => params.sort_dir = SortDirection::parse(value.trim()).unwrap_or_default(),
                _ => {}
            }
        }
        params.normalized(max_len)
    }

    /// Flatten into key/value pairs
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("v", PARAMS_FORMAT_VERSION.to_string()),
            ("search", self.search.clone()),
            ("subject_only", flag(self.subject_only)),
            ("show_complete", flag(self.show_complete)),
            ("compact", flag(self.compact)),
            ("userspec", self.user_filter.to_spec()),
            ("minage", self.min_age.to_string()),
            ("maxage", self.max_age.to_string()),
            ("sort", self.sort.as_str().to_string()),
            ("sort_dir", self.sort_dir.as_str().to_string()),
        ];
        if !self.boards.is_empty() {
            pairs.push(("brd", join_ids(self.boards.iter().map(|b| b.0))));
        }
        if !self.categories.is_empty() {
            pairs.push(("c", join_ids(self.categories.iter().map(|c| c.0))));
        }
        if let Some(topic) = self.topic {
            pairs.push(("topic", topic.0.to_string()));
        }
        pairs
    }

    /// Encode into an opaque URL-safe string
    ///
    /// The encoded form doubles as the cache staleness key: two requests
    /// describe the same search exactly when their encodings are equal.
    pub fn encode(&self) -> String {
        encode_pairs(self.to_pairs())
    }

    /// Decode a string produced by [`SearchParams::encode`]
    ///
    /// # Errors
    ///
    /// `InvalidParams` for undecodable input, plus any validation error of
    /// [`SearchParams::normalized`].
    pub fn decode(encoded: &str, max_len: usize) -> Result<Self> {
        let pairs = decode_pairs(encoded)?;
        Self::from_pairs(pairs, max_len)
    }
}

impl fmt::Display for SearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" sort={}:{}", self.search, self.sort.as_str(), self.sort_dir.as_str())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "on" | "yes")
}

fn flag(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

fn parse_id_list(value: &str) -> Vec<u64> {
    value
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect()
}

fn join_ids(ids: impl Iterator<Item = u64>) -> String {
    ids.map(|id| id.to_string()).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::MAX_SEARCH_LENGTH;
    use proptest::prelude::*;

    #[test]
    fn test_defaults() {
        let params = SearchParams::new("hello").normalized(MAX_SEARCH_LENGTH).unwrap();
        assert_eq!(params.min_age, 0);
        assert_eq!(params.max_age, 9999);
        assert_eq!(params.sort, SortKey::Relevance);
        assert_eq!(params.sort_dir, SortDirection::Desc);
        assert!(params.user_filter.is_anyone());
        assert!(params.compact);
    }

    #[test]
    fn test_empty_query_rejected() {
        let err = SearchParams::new("   ").normalized(MAX_SEARCH_LENGTH).unwrap_err();
        assert_eq!(err, SearchError::EmptyQuery);
    }

    #[test]
    fn test_too_long_rejected() {
        let long = "x".repeat(MAX_SEARCH_LENGTH + 1);
        let err = SearchParams::new(long).normalized(MAX_SEARCH_LENGTH).unwrap_err();
        assert!(matches!(err, SearchError::QueryTooLong { len: 101, max: 100 }));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let query = "ü".repeat(MAX_SEARCH_LENGTH);
        assert!(SearchParams::new(query).normalized(MAX_SEARCH_LENGTH).is_ok());
    }

    #[test]
    fn test_inverted_age_window_resets() {
        let params = SearchParams::new("x")
            .with_age(30, 10)
            .normalized(MAX_SEARCH_LENGTH)
            .unwrap();
        assert_eq!((params.min_age, params.max_age), (0, 9999));
    }

    #[test]
    fn test_max_age_clamped() {
        let params = SearchParams::new("x")
            .with_age(5, 50_000)
            .normalized(MAX_SEARCH_LENGTH)
            .unwrap();
        assert_eq!((params.min_age, params.max_age), (5, 9999));
    }

    #[test]
    fn test_subject_only_restricts_sort() {
        let params = SearchParams::new("x")
            .with_subject_only(true)
            .with_sort(SortKey::NumReplies, SortDirection::Asc)
            .normalized(MAX_SEARCH_LENGTH)
            .unwrap();
        assert_eq!(params.sort, SortKey::Relevance);
        assert_eq!(params.sort_dir, SortDirection::Asc);

        let params = SearchParams::new("x")
            .with_subject_only(true)
            .with_sort(SortKey::Age, SortDirection::Asc)
            .normalized(MAX_SEARCH_LENGTH)
            .unwrap();
        assert_eq!(params.sort, SortKey::Age);
    }

    #[test]
    fn test_boards_sorted_and_deduped() {
        let params = SearchParams::new("x")
            .with_boards(vec![BoardId(3), BoardId(1), BoardId(3)])
            .normalized(MAX_SEARCH_LENGTH)
            .unwrap();
        assert_eq!(params.boards, vec![BoardId(1), BoardId(3)]);
    }

    #[test]
    fn test_from_pairs_ignores_unknown_keys() {
        let params = SearchParams::from_pairs(
            vec![("search", "elk"), ("future_option", "42"), ("sort", "num_replies")],
            MAX_SEARCH_LENGTH,
        )
        .unwrap();
        assert_eq!(params.search, "elk");
        assert_eq!(params.sort, SortKey::NumReplies);
    }

    #[test]
    fn test_from_pairs_malformed_values_default() {
        let params = SearchParams::from_pairs(
            vec![
                ("search", "elk"),
                ("minage", "abc"),
                ("sort", "bogus"),
                ("brd", "1,x,2"),
                ("topic", "nope"),
            ],
            MAX_SEARCH_LENGTH,
        )
        .unwrap();
        assert_eq!(params.min_age, 0);
        assert_eq!(params.sort, SortKey::Relevance);
        assert_eq!(params.boards, vec![BoardId(1), BoardId(2)]);
        assert_eq!(params.topic, None);
    }

    #[test]
    fn test_decode_revalidates() {
        let encoded = encode_pairs(vec![("search", "x".repeat(150))]);
        let err = SearchParams::decode(&encoded, MAX_SEARCH_LENGTH).unwrap_err();
        assert!(matches!(err, SearchError::QueryTooLong { .. }));

        let encoded = encode_pairs(vec![
            ("search", "x".to_string()),
            ("minage", "40".to_string()),
            ("maxage", "20".to_string()),
        ]);
        let params = SearchParams::decode(&encoded, MAX_SEARCH_LENGTH).unwrap();
        assert_eq!((params.min_age, params.max_age), (0, 9999));
    }

    #[test]
    fn test_user_filter_parse() {
        assert_eq!(UserFilter::parse(""), UserFilter::Anyone);
        assert_eq!(UserFilter::parse(" * "), UserFilter::Anyone);
        assert_eq!(
            UserFilter::parse("alice, \"bob, jr\",alice"),
            UserFilter::Named(vec!["alice".into(), "bob, jr".into()])
        );
    }

    #[test]
    fn test_user_filter_spec_roundtrip() {
        let filter = UserFilter::Named(vec!["alice".into(), "bob, jr".into()]);
        assert_eq!(UserFilter::parse(&filter.to_spec()), filter);
    }

    #[test]
    fn test_encode_is_stable() {
        let a = SearchParams::new("elk").normalized(MAX_SEARCH_LENGTH).unwrap();
        let b = SearchParams::new(" elk ").normalized(MAX_SEARCH_LENGTH).unwrap();
        assert_eq!(a.encode(), b.encode());

        let c = a.clone().with_sort(SortKey::Age, SortDirection::Desc);
        assert_ne!(a.encode(), c.encode());
    }

    fn sort_strategy() -> impl Strategy<Value = SortKey> {
        prop_oneof![
            Just(SortKey::Relevance),
            Just(SortKey::NumReplies),
            Just(SortKey::Age)
        ]
    }

    fn dir_strategy() -> impl Strategy<Value = SortDirection> {
        prop_oneof![Just(SortDirection::Asc), Just(SortDirection::Desc)]
    }

    fn user_strategy() -> impl Strategy<Value = UserFilter> {
        prop_oneof![
            Just(UserFilter::Anyone),
            prop::collection::vec("[a-z][a-z0-9 ,|%']{0,10}[a-z]", 1..4).prop_map(|names| {
                UserFilter::parse(&UserFilter::Named(names).to_spec())
            }),
        ]
    }

    fn params_strategy() -> impl Strategy<Value = SearchParams> {
        (
            "[a-zA-Z0-9\"|%'+/= -]{1,100}",
            any::<bool>(),
            any::<bool>(),
            user_strategy(),
            prop::collection::vec(0u64..500, 0..5),
            prop::collection::vec(0u64..50, 0..3),
            prop::option::of(1u64..10_000),
            (0u32..20_000, 0u32..20_000),
            sort_strategy(),
            dir_strategy(),
            any::<bool>(),
        )
            .prop_filter_map(
                "query must survive normalization",
                |(search, subject_only, show_complete, user, boards, cats, topic, age, sort, dir, compact)| {
                    let mut params = SearchParams::new(search)
                        .with_subject_only(subject_only)
                        .with_show_complete(show_complete)
                        .with_user_filter(user)
                        .with_boards(boards.into_iter().map(BoardId).collect())
                        .with_categories(cats.into_iter().map(CategoryId).collect())
                        .with_age(age.0, age.1)
                        .with_sort(sort, dir)
                        .with_compact(compact);
                    params.topic = topic.map(TopicId);
                    params.normalized(MAX_SEARCH_LENGTH).ok()
                },
            )
    }

    proptest! {
        /// Property: decode(encode(p)) == p for any normalized params
        #[test]
        fn prop_encode_decode_roundtrip(params in params_strategy()) {
            let decoded = SearchParams::decode(&params.encode(), MAX_SEARCH_LENGTH).unwrap();
            prop_assert_eq!(decoded, params);
        }

        /// Property: normalization is idempotent
        #[test]
        fn prop_normalized_idempotent(params in params_strategy()) {
            let again = params.clone().normalized(MAX_SEARCH_LENGTH).unwrap();
            prop_assert_eq!(again, params);
        }
    }
}
