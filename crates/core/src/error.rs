//! Error types for boardsearch
//!
//! All failures of a search request are represented by [`SearchError`].
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! # Categories
//!
//! | Category | Variants | Handling |
//! |----------|----------|----------|
//! | Input | `EmptyQuery`, `QueryTooLong`, `InvalidSearchString`, `AllTermsIgnored`, `InvalidParams`, `VerificationFailed`, `NoBoardsAvailable` | Shown inline on the search form, never logged |
//! | Rate | `Overloaded`, `FloodProtection` | Refused before any work |
//! | Backend | `QueryNotSpecificEnough`, `NoBackendAvailable`, `Backend`, `Storage` | Degraded or propagated |
//! | Config | `Config` | Operator-facing |

use thiserror::Error;

/// Result type alias for search operations
pub type Result<T> = std::result::Result<T, SearchError>;

/// Broad classification of a [`SearchError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad user input; recoverable by editing the query
    Input,
    /// Refused by load or flood protection
    Rate,
    /// Matching backend or storage collaborator
    Backend,
    /// Operator misconfiguration
    Config,
}

/// Search errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    // ==================== Input ====================
    /// Query string was empty or whitespace only
    #[error("search string is empty")]
    EmptyQuery,

    /// Query string exceeded the character limit
    #[error("search string is too long: {len} characters, limit is {max}")]
    QueryTooLong {
        /// Characters submitted
        len: usize,
        /// Configured limit
        max: usize,
    },

    /// No usable search term could be extracted
    #[error("search string contains no searchable words")]
    InvalidSearchString,

    /// Every term was dropped by the stop-word list or length filter
    #[error("all search terms were ignored: {}", ignored.join(", "))]
    AllTermsIgnored {
        /// Terms that were dropped
        ignored: Vec<String>,
    },

    /// Encoded parameter string could not be decoded
    #[error("invalid search parameters: {reason}")]
    InvalidParams {
        /// What was wrong
        reason: String,
    },

    /// Guest verification (captcha or equivalent) failed
    #[error("verification failed")]
    VerificationFailed,

    /// Caller cannot see any of the requested boards
    #[error("no boards available to search")]
    NoBoardsAvailable,

    // ==================== Rate ====================
    /// Server load is above the configured search threshold
    #[error("search is temporarily disabled due to high load")]
    Overloaded,

    /// Caller searched too recently
    #[error("searching too often, wait {wait_secs} seconds")]
    FloodProtection {
        /// Seconds until the next search is allowed
        wait_secs: u64,
    },

    // ==================== Backend ====================
    /// Backend forced a full run and found nothing
    #[error("query is not specific enough")]
    QueryNotSpecificEnough,

    /// No registered backend supports the requested search
    #[error("no search backend supports this query")]
    NoBackendAvailable,

    /// Backend failure
    #[error("backend '{backend}' failed: {reason}")]
    Backend {
        /// Backend name
        backend: String,
        /// Failure description
        reason: String,
    },

    /// Storage collaborator failure
    #[error("storage error: {0}")]
    Storage(String),

    // ==================== Config ====================
    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl SearchError {
    /// Create an InvalidParams error
    pub fn invalid_params(reason: impl Into<String>) -> Self {
        SearchError::InvalidParams {
            reason: reason.into(),
        }
    }

    /// Create a Backend error
    pub fn backend(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        SearchError::Backend {
            backend: backend.into(),
            reason: reason.into(),
        }
    }

    /// Category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            SearchError::EmptyQuery
            | SearchError::QueryTooLong { .. }
            | SearchError::InvalidSearchString
            | SearchError::AllTermsIgnored { .. }
            | SearchError::InvalidParams { .. }
            | SearchError::VerificationFailed
            | SearchError::NoBoardsAvailable => ErrorCategory::Input,
            SearchError::Overloaded | SearchError::FloodProtection { .. } => ErrorCategory::Rate,
            SearchError::QueryNotSpecificEnough
            | SearchError::NoBackendAvailable
            | SearchError::Backend { .. }
            | SearchError::Storage(_) => ErrorCategory::Backend,
            SearchError::Config(_) => ErrorCategory::Config,
        }
    }

    /// Stable code for the presentation layer
    ///
    /// Codes are part of the public contract: templates key their messages
    /// on them.
    pub fn code(&self) -> &'static str {
        match self {
            SearchError::EmptyQuery => "search_string_empty",
            SearchError::QueryTooLong { .. } => "string_too_long",
            SearchError::InvalidSearchString => "invalid_search_string",
            SearchError::AllTermsIgnored { .. } => "invalid_search_string_blacklist",
            SearchError::InvalidParams { .. } => "invalid_search_params",
            SearchError::VerificationFailed => "need_verification_code",
            SearchError::NoBoardsAvailable => "no_boards_to_search",
            SearchError::Overloaded => "loadavg_search_disabled",
            SearchError::FloodProtection { .. } => "search_flood",
            SearchError::QueryNotSpecificEnough => "query_not_specific_enough",
            SearchError::NoBackendAvailable => "search_api_missing",
            SearchError::Backend { .. } => "search_backend_failed",
            SearchError::Storage(_) => "search_storage_failed",
            SearchError::Config(_) => "search_config_invalid",
        }
    }

    /// True for errors the user can fix by changing the query
    pub fn is_user_error(&self) -> bool {
        self.category() == ErrorCategory::Input
    }
}
