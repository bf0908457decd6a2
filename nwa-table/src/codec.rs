//! Query-parameter codec
//!
//! Translates between typed values and the delimited strings that end up in a
//! URL query string, and parses/builds query strings themselves. The table
//! state and the collection client both go through this module so that what
//! is sent to the backend and what is written to the address bar stay in
//! agreement.
//!
//! # Delimiters
//!
//! Arrays are joined with [`ARRAY_DELIMITER`] (`,`). The delimiter is reserved:
//! elements containing it are rejected instead of escaped.
//!
//! # Example
//!
//! ```rust
//! use nwa_table::codec::{decode_numeric_array, encode_numeric_array, get_parameter_by_name};
//!
//! let encoded = encode_numeric_array(&[0, 24]);
//! assert_eq!(encoded, "0,24");
//! assert_eq!(decode_numeric_array(&encoded).unwrap(), vec![0, 24]);
//!
//! assert_eq!(get_parameter_by_name("b", "?a=1&b=3"), "3");
//! assert_eq!(get_parameter_by_name("z", "?a=1"), "");
//! ```

use std::collections::BTreeMap;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between array elements
pub const ARRAY_DELIMITER: char = ',';

/// Characters escaped by `encodeURIComponent`
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Codec failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// An array element was not an integer
    #[error("'{0}' is not an integer")]
    InvalidNumber(String),

    /// A value contains a delimiter reserved by the encoding
    #[error("value '{value}' contains reserved delimiter '{delimiter}'")]
    ReservedDelimiter {
        /// Offending value
        value: String,
        /// Delimiter that may not appear in it
        delimiter: char,
    },

    /// A parameter had an unexpected shape
    #[error("invalid '{param}' parameter: {reason}")]
    InvalidParameter {
        /// Parameter name
        param: String,
        /// What was wrong with it
        reason: String,
    },
}

/// Join integers with the array delimiter
#[must_use]
pub fn encode_numeric_array(values: &[i64]) -> String {
    values
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Inverse of [`encode_numeric_array`]
///
/// # Errors
///
/// Returns [`CodecError::InvalidNumber`] for any element that is not an integer.
pub fn decode_numeric_array(encoded: &str) -> Result<Vec<i64>, CodecError> {
    decode_string_array(encoded)
        .into_iter()
        .map(|entry| {
            entry
                .trim()
                .parse::<i64>()
                .map_err(|_| CodecError::InvalidNumber(entry))
        })
        .collect()
}

/// Join strings with the array delimiter
///
/// # Errors
///
/// Returns [`CodecError::ReservedDelimiter`] when an element contains `,`.
pub fn encode_string_array<S: AsRef<str>>(values: &[S]) -> Result<String, CodecError> {
    let mut parts = Vec::with_capacity(values.len());
    for value in values {
        let value = value.as_ref();
        ensure_no_delimiter(value, ARRAY_DELIMITER)?;
        parts.push(value);
    }
    Ok(parts.join(","))
}

/// Inverse of [`encode_string_array`]
///
/// The empty string decodes to an empty sequence.
#[must_use]
pub fn decode_string_array(encoded: &str) -> Vec<String> {
    if encoded.is_empty() {
        return Vec::new();
    }
    encoded.split(ARRAY_DELIMITER).map(str::to_string).collect()
}

/// Reject `value` if it contains `delimiter`
///
/// # Errors
///
/// Returns [`CodecError::ReservedDelimiter`] when the delimiter is present.
pub fn ensure_no_delimiter(value: &str, delimiter: char) -> Result<(), CodecError> {
    if value.contains(delimiter) {
        return Err(CodecError::ReservedDelimiter {
            value: value.to_string(),
            delimiter,
        });
    }
    Ok(())
}

/// A parsed query-string value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Key appeared exactly once
    Single(String),
    /// Key appeared more than once, in order of appearance
    Multi(Vec<String>),
}

impl ParamValue {
    /// First value for the key
    #[must_use]
    pub fn first(&self) -> &str {
        match self {
            Self::Single(value) => value,
            Self::Multi(values) => values.first().map_or("", String::as_str),
        }
    }

    /// All values for the key
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Single(value) => vec![value.as_str()],
            Self::Multi(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

/// Query-string parameters keyed by decoded name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<String, ParamValue>);

impl QueryParams {
    /// Value for `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    /// First value for `key`
    #[must_use]
    pub fn first(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(ParamValue::first)
    }

    /// Whether `key` is present
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of distinct keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no keys are present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over keys and values in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }
}

/// Split `search` into decoded `(key, value)` pairs, in order
///
/// A key without `=` yields an empty value.
fn decoded_pairs(search: &str) -> impl Iterator<Item = (String, String)> + '_ {
    search
        .strip_prefix('?')
        .unwrap_or(search)
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (decode_component(key), decode_component(value)),
            None => (decode_component(pair), String::new()),
        })
}

/// Decode a single query-string component
///
/// `+` is treated as a space before percent-decoding so that an encoded `%2B`
/// survives as a literal plus.
#[must_use]
pub fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Encode a single query-string component the way `encodeURIComponent` does
#[must_use]
pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT).to_string()
}

/// Parse `?key=value&key=value` into [`QueryParams`]
///
/// # Example
///
/// ```rust
/// use nwa_table::codec::{parse_query_string, ParamValue};
///
/// let params = parse_query_string("?a=1&a=2&b=3");
/// assert_eq!(
///     params.get("a"),
///     Some(&ParamValue::Multi(vec!["1".to_string(), "2".to_string()]))
/// );
/// assert_eq!(params.get("b"), Some(&ParamValue::Single("3".to_string())));
/// ```
#[must_use]
pub fn parse_query_string(search: &str) -> QueryParams {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in decoded_pairs(search) {
        grouped.entry(key).or_default().push(value);
    }

    QueryParams(
        grouped
            .into_iter()
            .map(|(key, mut values)| {
                let value = if values.len() == 1 {
                    ParamValue::Single(values.remove(0))
                } else {
                    ParamValue::Multi(values)
                };
                (key, value)
            })
            .collect(),
    )
}

/// First decoded value for `name`, or `""` when absent
#[must_use]
pub fn get_parameter_by_name(name: &str, search: &str) -> String {
    decoded_pairs(search)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
        .unwrap_or_default()
}

/// Build `?key=value&...` from ordered pairs
///
/// Returns an empty string when there are no pairs.
#[must_use]
pub fn build_query_string<K, V>(pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if pairs.is_empty() {
        return String::new();
    }
    let joined = pairs
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                encode_component(key.as_ref()),
                encode_component(value.as_ref())
            )
        })
        .collect::<Vec<_>>()
        .join("&");
    format!("?{joined}")
}
