//! Search configuration via `boardsearch.toml`
//!
//! Operators tune limits, ranking weights and rendering through a single
//! TOML file. On first start a commented default file can be written with
//! [`SearchConfig::write_default_if_missing`]; edit it and restart.

use boardsearch_core::limits::{CACHE_POINTER_MODULUS, DEFAULT_MAX_TERMS, MAX_SEARCH_LENGTH};
use boardsearch_core::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "boardsearch.toml";

/// Words ignored in queries unless configured otherwise
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "img", "url", "quote", "www", "http", "the", "is", "it", "are", "if", "in",
];

/// Search configuration loaded from `boardsearch.toml`.
///
/// # Example
///
/// ```toml
/// results_per_page = 30
/// huge_topic_posts = 200
///
/// [weights]
/// frequency = 30
/// age = 25
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum characters in a query
    pub max_query_length: usize,
    /// Cap on distinct required terms
    pub max_terms: usize,
    /// Words shorter than this (in characters) are ignored
    pub min_word_length: usize,
    /// Results shown per page
    pub results_per_page: usize,
    /// Enumerated result sets are truncated to this many rows
    pub max_results: usize,
    /// Reply count at which a topic gets the full length score
    pub huge_topic_posts: u32,
    /// Messages older than this many days (relative to the newest) get no age score
    pub ancient_days: u32,
    /// Characters kept on each side of a match in compact mode
    pub compact_radius: usize,
    /// Number of cache pointers before wrapping
    pub cache_modulus: u16,
    /// Seconds a cached result set stays valid
    pub cache_ttl_secs: u64,
    /// Refuse searches while the load guard reports more than this
    pub load_limit: Option<f64>,
    /// Require guests to pass verification on every new search
    pub guest_verification: bool,
    /// Stop-word list
    pub stopwords: Vec<String>,
    /// Markup opening a highlighted match
    pub highlight_open: String,
    /// Markup closing a highlighted match
    pub highlight_close: String,
    /// Separator between compact excerpts
    pub ellipsis: String,
    /// Ranking factor weights, 0-100 each
    pub weights: BTreeMap<String, i64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            max_query_length: MAX_SEARCH_LENGTH,
            max_terms: DEFAULT_MAX_TERMS,
            min_word_length: 2,
            results_per_page: 30,
            max_results: 600,
            huge_topic_posts: 200,
            ancient_days: 365,
            compact_radius: 50,
            cache_modulus: CACHE_POINTER_MODULUS,
            cache_ttl_secs: 1800,
            load_limit: None,
            guest_verification: false,
            stopwords: DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect(),
            highlight_open: "<strong class=\"highlight\">".to_string(),
            highlight_close: "</strong>".to_string(),
            ellipsis: " ... ".to_string(),
            weights: default_weights(),
        }
    }
}

fn default_weights() -> BTreeMap<String, i64> {
    [
        ("frequency", 30),
        ("age", 25),
        ("length", 20),
        ("subject", 15),
        ("first_message", 10),
        ("sticky", 0),
        ("likes", 0),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

impl SearchConfig {
    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns `Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.max_query_length == 0 || self.max_query_length > MAX_SEARCH_LENGTH {
            return Err(SearchError::Config(format!(
                "max_query_length must be between 1 and {}, got {}",
                MAX_SEARCH_LENGTH, self.max_query_length
            )));
        }
        if self.max_terms == 0 {
            return Err(SearchError::Config("max_terms must be at least 1".into()));
        }
        if self.results_per_page == 0 {
            return Err(SearchError::Config(
                "results_per_page must be at least 1".into(),
            ));
        }
        if self.max_results == 0 {
            return Err(SearchError::Config("max_results must be at least 1".into()));
        }
        if self.huge_topic_posts == 0 {
            return Err(SearchError::Config(
                "huge_topic_posts must be at least 1".into(),
            ));
        }
        if self.ancient_days == 0 {
            return Err(SearchError::Config("ancient_days must be at least 1".into()));
        }
        if self.cache_modulus < 2 || self.cache_modulus > CACHE_POINTER_MODULUS {
            return Err(SearchError::Config(format!(
                "cache_modulus must be between 2 and {}, got {}",
                CACHE_POINTER_MODULUS, self.cache_modulus
            )));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# boardsearch configuration

# Longest accepted query, in characters (at most 100)
max_query_length = 100

# Distinct required terms kept per query; the rest are dropped
max_terms = 10

# Words shorter than this are ignored
min_word_length = 2

# Paging
results_per_page = 30
# Full match sets are truncated to this many rows before caching
max_results = 600

# Topics with at least this many replies get the full length score
huge_topic_posts = 200
# Messages this many days older than the newest message get no age score
ancient_days = 365

# Characters kept around each match in compact mode
compact_radius = 50

# Result cache: pointer range and lifetime
cache_modulus = 256
cache_ttl_secs = 1800

# Refuse searches above this load (uncomment to enable)
# load_limit = 8.0

# Require guests to pass verification before each new search
guest_verification = false

stopwords = ["img", "url", "quote", "www", "http", "the", "is", "it", "are", "if", "in"]

highlight_open = '<strong class="highlight">'
highlight_close = "</strong>"
ellipsis = " ... "

# Relative ranking weights, 0-100 each. If they sum to zero the built-in
# defaults are used instead and an error is logged.
[weights]
frequency = 30
age = 25
length = 20
subject = 15
first_message = 10
sticky = 0
likes = 0
"#
    }

    /// Parse config from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SearchConfig = toml::from_str(content)
            .map_err(|e| SearchError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SearchError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            SearchError::Config(reason) => {
                SearchError::Config(format!("{} ({})", reason, path.display()))
            }
            other => other,
        })
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                SearchError::Config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}
