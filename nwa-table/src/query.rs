//! Query types for collection requests
//!
//! A [`CollectionQuery`] is the range, sort and filter combination that is sent
//! to a collection endpoint. It also acts as the cache key for ETag-based
//! conditional requests: two queries that compare equal produce the same
//! request parameters.
//!
//! # Example
//!
//! ```rust
//! use nwa_table::query::{CollectionQuery, FilterRule, RowRange, SortOrder, SortRule};
//!
//! let query = CollectionQuery::new()
//!     .with_range(RowRange::new(0, 24).unwrap())
//!     .with_sort(SortRule::new("start_date", SortOrder::Desc))
//!     .with_filter(FilterRule::new("status", vec!["active".into(), "terminated".into()]));
//!
//! let params = query.to_params().unwrap();
//! assert_eq!(
//!     params,
//!     vec![
//!         ("range", "0,24".to_string()),
//!         ("sort", "start_date,desc".to_string()),
//!         ("filter", "status,active-terminated".to_string()),
//!     ]
//! );
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::{
    decode_numeric_array, decode_string_array, encode_numeric_array, encode_string_array,
    ensure_no_delimiter, CodecError, ARRAY_DELIMITER,
};

/// Separator between the values of one filter
pub const FILTER_VALUE_DELIMITER: char = '-';

/// Name of the range query parameter
pub const RANGE_PARAM: &str = "range";

/// Name of the sort query parameter
pub const SORT_PARAM: &str = "sort";

/// Name of the filter query parameter
pub const FILTER_PARAM: &str = "filter";

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending (A-Z, 0-9, oldest first)
    #[default]
    Asc,
    /// Descending (Z-A, 9-0, newest first)
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

impl SortOrder {
    /// The opposite direction
    #[must_use]
    pub const fn inverted(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// Whether this is [`SortOrder::Desc`]
    #[must_use]
    pub const fn is_descending(self) -> bool {
        matches!(self, Self::Desc)
    }

    fn parse(raw: &str) -> Result<Self, CodecError> {
        match raw.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(CodecError::InvalidParameter {
                param: SORT_PARAM.to_string(),
                reason: format!("unknown direction '{other}'"),
            }),
        }
    }
}

/// One sort criterion
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortRule {
    /// Column id
    pub id: String,
    /// Direction
    pub order: SortOrder,
}

impl SortRule {
    /// Create a sort rule
    #[must_use]
    pub fn new(id: impl Into<String>, order: SortOrder) -> Self {
        Self {
            id: id.into(),
            order,
        }
    }

    /// Ascending sort on `id`
    #[must_use]
    pub fn asc(id: impl Into<String>) -> Self {
        Self::new(id, SortOrder::Asc)
    }

    /// Descending sort on `id`
    #[must_use]
    pub fn desc(id: impl Into<String>) -> Self {
        Self::new(id, SortOrder::Desc)
    }
}

/// A named filter dimension and its accepted values
///
/// Values may not contain `-` (it separates values on the wire) or `,` (it
/// separates array elements). Identifiers that legitimately contain hyphens,
/// such as organisation UUIDs, are stored split into their parts; see
/// [`FilterRule::from_hyphenated`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterRule {
    /// Filter dimension
    pub id: String,
    /// Accepted values
    pub values: Vec<String>,
}

impl FilterRule {
    /// Create a filter rule
    #[must_use]
    pub fn new(id: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            id: id.into(),
            values,
        }
    }

    /// Store a hyphen-containing identifier as its hyphen-separated parts
    ///
    /// ```rust
    /// use nwa_table::query::FilterRule;
    ///
    /// let rule = FilterRule::from_hyphenated("organisation", "2f47f65a-0911-e511-80d0");
    /// assert_eq!(rule.values, vec!["2f47f65a", "0911", "e511", "80d0"]);
    /// assert_eq!(rule.joined_values(), "2f47f65a-0911-e511-80d0");
    /// ```
    #[must_use]
    pub fn from_hyphenated(id: impl Into<String>, value: &str) -> Self {
        Self::new(
            id,
            value
                .split(FILTER_VALUE_DELIMITER)
                .map(str::to_string)
                .collect(),
        )
    }

    /// Values joined with the filter value delimiter
    #[must_use]
    pub fn joined_values(&self) -> String {
        self.values.join("-")
    }

    /// Check that no value contains a reserved delimiter
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::ReservedDelimiter`] for the first offending value.
    pub fn validate(&self) -> Result<(), CodecError> {
        ensure_no_delimiter(&self.id, ARRAY_DELIMITER)?;
        for value in &self.values {
            ensure_no_delimiter(value, FILTER_VALUE_DELIMITER)?;
            ensure_no_delimiter(value, ARRAY_DELIMITER)?;
        }
        Ok(())
    }
}

/// Largest row number a range may reach; bounds travel as signed integers
pub const MAX_ROW: u64 = i64::MAX as u64;

/// Zero-based, inclusive window of rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRowRange")]
pub struct RowRange {
    start: u64,
    end: u64,
}

#[derive(Deserialize)]
struct RawRowRange {
    start: u64,
    end: u64,
}

impl TryFrom<RawRowRange> for RowRange {
    type Error = String;

    fn try_from(raw: RawRowRange) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
            .ok_or_else(|| format!("invalid range {}-{}", raw.start, raw.end))
    }
}

impl RowRange {
    /// Create a range, returning `None` when `start > end` or `end > MAX_ROW`
    #[must_use]
    pub const fn new(start: u64, end: u64) -> Option<Self> {
        if start > end || end > MAX_ROW {
            None
        } else {
            Some(Self { start, end })
        }
    }

    /// Range covering page `page_index` (zero-based) of `page_size` rows
    ///
    /// A page size of zero is treated as one. Bounds are clamped to [`MAX_ROW`].
    ///
    /// ```rust
    /// use nwa_table::query::RowRange;
    ///
    /// let range = RowRange::for_page(2, 25);
    /// assert_eq!((range.start(), range.end()), (50, 74));
    /// ```
    #[must_use]
    pub fn for_page(page_index: u64, page_size: u64) -> Self {
        let page_size = page_size.max(1);
        let start = page_index.saturating_mul(page_size).min(MAX_ROW);
        Self {
            start,
            end: start.saturating_add(page_size - 1).min(MAX_ROW),
        }
    }

    /// First row
    #[must_use]
    pub const fn start(&self) -> u64 {
        self.start
    }

    /// Last row (inclusive)
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.end
    }

    /// Number of rows covered
    #[must_use]
    pub const fn len(&self) -> u64 {
        (self.end - self.start).saturating_add(1)
    }

    /// Always false; a range covers at least one row
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    fn encode(&self) -> Result<String, CodecError> {
        let bound = |value: u64| {
            i64::try_from(value).map_err(|_| CodecError::InvalidParameter {
                param: RANGE_PARAM.to_string(),
                reason: format!("{value} is out of range"),
            })
        };
        Ok(encode_numeric_array(&[bound(self.start)?, bound(self.end)?]))
    }

    /// Parse a `start,end` parameter
    ///
    /// # Errors
    ///
    /// Fails when the value is not two non-negative integers with `start <= end`.
    pub fn decode(encoded: &str) -> Result<Self, CodecError> {
        let invalid = |reason: &str| CodecError::InvalidParameter {
            param: RANGE_PARAM.to_string(),
            reason: reason.to_string(),
        };
        match decode_numeric_array(encoded)?.as_slice() {
            &[start, end] => {
                let start = u64::try_from(start).map_err(|_| invalid("negative bound"))?;
                let end = u64::try_from(end).map_err(|_| invalid("negative bound"))?;
                Self::new(start, end).ok_or_else(|| invalid("start is after end"))
            }
            _ => Err(invalid("expected exactly two bounds")),
        }
    }
}

/// Range, sort and filter for one collection request
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionQuery {
    /// Requested rows; `None` lets the server pick its default page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<RowRange>,

    /// Ordered sort criteria
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortRule>,

    /// Filters
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<FilterRule>,
}

impl CollectionQuery {
    /// Create an empty query
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the row range
    #[must_use]
    pub fn with_range(mut self, range: RowRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Add a sort criterion
    #[must_use]
    pub fn with_sort(mut self, rule: SortRule) -> Self {
        self.sort.push(rule);
        self
    }

    /// Add a filter
    #[must_use]
    pub fn with_filter(mut self, rule: FilterRule) -> Self {
        self.filter.push(rule);
        self
    }

    /// Encode as `(name, value)` request parameters
    ///
    /// Parameters are omitted when their part of the query is empty.
    ///
    /// # Errors
    ///
    /// Fails when a sort or filter id contains `,`, or a filter value contains
    /// `-` or `,`.
    pub fn to_params(&self) -> Result<Vec<(&'static str, String)>, CodecError> {
        let mut params = Vec::with_capacity(3);

        if let Some(range) = &self.range {
            params.push((RANGE_PARAM, range.encode()?));
        }

        if !self.sort.is_empty() {
            let flat: Vec<String> = self
                .sort
                .iter()
                .flat_map(|rule| [rule.id.clone(), rule.order.to_string()])
                .collect();
            params.push((SORT_PARAM, encode_string_array(&flat)?));
        }

        if !self.filter.is_empty() {
            let mut flat = Vec::with_capacity(self.filter.len() * 2);
            for rule in &self.filter {
                rule.validate()?;
                flat.push(rule.id.clone());
                flat.push(rule.joined_values());
            }
            params.push((FILTER_PARAM, encode_string_array(&flat)?));
        }

        Ok(params)
    }

    /// Decode a `sort` parameter into rules
    ///
    /// # Errors
    ///
    /// Fails on an odd number of elements or an unknown direction.
    pub fn decode_sort(encoded: &str) -> Result<Vec<SortRule>, CodecError> {
        let flat = decode_string_array(encoded);
        if flat.len() % 2 != 0 {
            return Err(CodecError::InvalidParameter {
                param: SORT_PARAM.to_string(),
                reason: "expected id/direction pairs".to_string(),
            });
        }
        flat.chunks(2)
            .map(|pair| Ok(SortRule::new(pair[0].clone(), SortOrder::parse(&pair[1])?)))
            .collect()
    }

    /// Decode a `filter` parameter into rules
    ///
    /// Each value string is split on `-`, so hyphenated identifiers come back
    /// as their parts.
    ///
    /// # Errors
    ///
    /// Fails on an odd number of elements.
    pub fn decode_filter(encoded: &str) -> Result<Vec<FilterRule>, CodecError> {
        let flat = decode_string_array(encoded);
        if flat.len() % 2 != 0 {
            return Err(CodecError::InvalidParameter {
                param: FILTER_PARAM.to_string(),
                reason: "expected id/values pairs".to_string(),
            });
        }
        Ok(flat
            .chunks(2)
            .map(|pair| FilterRule::from_hyphenated(pair[0].clone(), &pair[1]))
            .collect())
    }
}
