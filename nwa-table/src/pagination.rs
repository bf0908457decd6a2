//! Page navigation for collection tables
//!
//! The backend reports the collection size through `Content-Range`, but may
//! leave it unknown. [`Paginator`] works in both cases: with a total it knows
//! the last page, without one it enables "next" only while a full page came
//! back.
//!
//! # Example
//!
//! ```rust
//! use nwa_table::pagination::Paginator;
//!
//! let pager = Paginator::new(0, 10, Some(42));
//! assert_eq!(pager.page_count(), Some(5));
//! assert!(pager.can_next(10));
//! assert_eq!(pager.last().map(|p| p.page_index), Some(4));
//! ```

use serde::{Deserialize, Serialize};

use crate::query::RowRange;

/// Page sizes offered to the user
pub const PAGE_SIZE_OPTIONS: [u64; 5] = [5, 10, 25, 50, 100];

/// Page size used when none is configured
pub const DEFAULT_PAGE_SIZE: u64 = 25;

/// Position within a paginated collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginator {
    /// Zero-based page index
    pub page_index: u64,
    /// Rows per page, at least one
    pub page_size: u64,
    /// Total rows, when the backend reported it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl Paginator {
    /// Create a paginator
    ///
    /// A page size of zero is treated as one.
    #[must_use]
    pub fn new(page_index: u64, page_size: u64, total: Option<u64>) -> Self {
        Self {
            page_index,
            page_size: page_size.max(1),
            total,
        }
    }

    /// Number of pages, when the total is known
    ///
    /// An empty collection still has one (empty) page.
    #[must_use]
    pub fn page_count(&self) -> Option<u64> {
        self.total
            .map(|total| total.div_ceil(self.page_size).max(1))
    }

    /// Whether a previous page exists
    #[must_use]
    pub fn can_previous(&self) -> bool {
        self.page_index > 0
    }

    /// Whether a next page exists
    ///
    /// `rows_on_page` is the number of rows the current page returned; it
    /// decides the answer when the total is unknown.
    #[must_use]
    pub fn can_next(&self, rows_on_page: usize) -> bool {
        let Some(next_index) = self.page_index.checked_add(1) else {
            return false;
        };
        match self.page_count() {
            Some(count) => next_index < count,
            None => rows_on_page as u64 >= self.page_size,
        }
    }

    /// Rows covered by the current page
    #[must_use]
    pub fn range(&self) -> RowRange {
        RowRange::for_page(self.page_index, self.page_size)
    }

    /// First page
    #[must_use]
    pub fn first(&self) -> Self {
        self.at(0)
    }

    /// Previous page, if any
    #[must_use]
    pub fn previous(&self) -> Option<Self> {
        self.can_previous().then(|| self.at(self.page_index - 1))
    }

    /// Next page, if any
    #[must_use]
    pub fn next(&self, rows_on_page: usize) -> Option<Self> {
        self.can_next(rows_on_page)
            .then(|| self.at(self.page_index + 1))
    }

    /// Last page, when the total is known
    #[must_use]
    pub fn last(&self) -> Option<Self> {
        self.page_count().map(|count| self.at(count - 1))
    }

    /// One-based "x-y of z" label
    #[must_use]
    pub fn label(&self, rows_on_page: usize) -> String {
        if rows_on_page == 0 {
            return match self.total {
                Some(total) => format!("0 of {total}"),
                None => "0".to_string(),
            };
        }
        let first = self.range().start();
        let start = first.saturating_add(1);
        let end = first.saturating_add(rows_on_page as u64);
        match self.total {
            Some(total) => format!("{start}-{end} of {total}"),
            None => format!("{start}-{end}"),
        }
    }

    fn at(&self, page_index: u64) -> Self {
        Self { page_index, ..*self }
    }
}
