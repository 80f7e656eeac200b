//! Opaque, URL-safe encoding of flat key/value parameter sets
//!
//! Wire format (before encoding):
//!
//! ```text
//! key|'|value|"|key|'|value|"|...
//! ```
//!
//! The joined string is base64 encoded with the URL-safe alphabet and no
//! padding, so it can travel in a query string unchanged. `%` and `|` inside
//! keys and values are percent-escaped before joining, which keeps the
//! sentinels unambiguous whatever the user typed.

use crate::error::{Result, SearchError};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64, Engine};

/// Separator between a key and its value
pub const KEY_VALUE_SEPARATOR: &str = "|'|";

/// Separator between pairs
pub const PAIR_SEPARATOR: &str = "|\"|";

fn escape(raw: &str) -> String {
    raw.replace('%', "%25").replace('|', "%7C")
}

fn unescape(escaped: &str) -> String {
    escaped.replace("%7C", "|").replace("%25", "%")
}

/// Encode key/value pairs into an opaque URL-safe string
pub fn encode_pairs<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, String)>,
{
    let joined = pairs
        .into_iter()
        .map(|(k, v)| format!("{}{}{}", escape(k), KEY_VALUE_SEPARATOR, escape(&v)))
        .collect::<Vec<_>>()
        .join(PAIR_SEPARATOR);
    BASE64.encode(joined.as_bytes())
}

/// Decode an opaque string produced by [`encode_pairs`]
///
/// Pairs without a key/value separator are skipped rather than rejected, so
/// strings produced by later format revisions still decode.
///
/// # Errors
///
/// Returns `InvalidParams` when the input is not valid base64 or not UTF-8.
pub fn decode_pairs(encoded: &str) -> Result<Vec<(String, String)>> {
    // Tolerate padded input from older links
    let trimmed = encoded.trim().trim_end_matches('=');
    let bytes = BASE64
        .decode(trimmed)
        .map_err(|e| SearchError::invalid_params(format!("bad encoding: {}", e)))?;
    let joined = String::from_utf8(bytes)
        .map_err(|_| SearchError::invalid_params("parameters are not valid UTF-8"))?;

    Ok(joined
        .split(PAIR_SEPARATOR)
        .filter_map(|pair| pair.split_once(KEY_VALUE_SEPARATOR))
        .map(|(k, v)| (unescape(k), unescape(v)))
        .collect())
}
