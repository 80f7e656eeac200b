//! Fixed limits shared by the parameter codec and the tokenizer
//!
//! These are the hard bounds of the public search contract. Operator-tunable
//! values (page size, term cap, context radius) live in the search crate's
//! configuration and default to the constants here.

/// Maximum characters in a raw search string
pub const MAX_SEARCH_LENGTH: usize = 100;

/// Default cap on distinct required terms per query
pub const DEFAULT_MAX_TERMS: usize = 10;

/// Lower bound of the age window, in days
pub const MIN_AGE_DAYS: u32 = 0;

/// Upper bound of the age window, in days
///
/// A `maxage` of this value means "no upper bound".
pub const MAX_AGE_DAYS: u32 = 9999;

/// Number of distinct cache pointers before wrapping
pub const CACHE_POINTER_MODULUS: u16 = 256;

/// Version tag written into encoded parameter strings
pub const PARAMS_FORMAT_VERSION: u32 = 1;

/// Seconds in one day
pub const SECONDS_PER_DAY: i64 = 86_400;
