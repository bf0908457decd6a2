//! Table state controller
//!
//! [`TableState`] holds the sort, filter, paging and column-visibility state of
//! one displayed collection. It changes only through [`TableAction`]s, each of
//! which is a pure reducer step. A state can be written to and restored from
//! the URL query string so that a view survives a reload or can be shared.
//!
//! # Example
//!
//! ```rust
//! use nwa_table::table::{TableAction, TableState};
//!
//! let state = TableState::new(25)
//!     .reduce(TableAction::filter_add("status", "active"))
//!     .reduce(TableAction::filter_add("status", "terminated"));
//!
//! assert_eq!(state.filter_values("status"), Some(&["active".to_string(), "terminated".to_string()][..]));
//! ```

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::codec::{build_query_string, parse_query_string, CodecError};
use crate::debounce::Debouncer;
use crate::query::{
    CollectionQuery, FilterRule, RowRange, SortOrder, SortRule, FILTER_PARAM, RANGE_PARAM,
    SORT_PARAM,
};

/// A state transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableAction {
    /// Add a value to a filter, creating the filter if needed
    FilterAdd {
        /// Filter id
        id: String,
        /// Value to add
        value: String,
    },
    /// Remove a value from a filter, dropping the filter when it empties
    FilterRemove {
        /// Filter id
        id: String,
        /// Value to remove
        value: String,
    },
    /// Set a filter's values, inserting the filter if needed
    FilterReplace {
        /// Filter id
        id: String,
        /// New values
        values: Vec<String>,
    },
    /// Remove a filter
    FilterClear {
        /// Filter id
        id: String,
    },
    /// Column-header click
    ToggleSort {
        /// Column id
        id: String,
    },
    /// Jump to a page
    SetPageIndex {
        /// Zero-based page index
        index: u64,
    },
    /// Change the number of rows per page
    SetPageSize {
        /// Rows per page
        size: u64,
    },
    /// Show or hide a column
    ToggleHiddenColumn {
        /// Column id
        id: String,
    },
}

impl TableAction {
    /// [`TableAction::FilterAdd`]
    #[must_use]
    pub fn filter_add(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self::FilterAdd {
            id: id.into(),
            value: value.into(),
        }
    }

    /// [`TableAction::FilterRemove`]
    #[must_use]
    pub fn filter_remove(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self::FilterRemove {
            id: id.into(),
            value: value.into(),
        }
    }

    /// [`TableAction::FilterReplace`]
    #[must_use]
    pub fn filter_replace(id: impl Into<String>, values: Vec<String>) -> Self {
        Self::FilterReplace {
            id: id.into(),
            values,
        }
    }

    /// [`TableAction::FilterReplace`] for a hyphen-containing identifier,
    /// stored as its hyphen-separated parts
    #[must_use]
    pub fn filter_replace_hyphenated(id: impl Into<String>, value: &str) -> Self {
        let rule = FilterRule::from_hyphenated(id, value);
        Self::FilterReplace {
            id: rule.id,
            values: rule.values,
        }
    }

    /// [`TableAction::FilterClear`]
    #[must_use]
    pub fn filter_clear(id: impl Into<String>) -> Self {
        Self::FilterClear { id: id.into() }
    }

    /// [`TableAction::ToggleSort`]
    #[must_use]
    pub fn toggle_sort(id: impl Into<String>) -> Self {
        Self::ToggleSort { id: id.into() }
    }

    fn changes_rows(&self) -> bool {
        !matches!(
            self,
            Self::SetPageIndex { .. } | Self::ToggleHiddenColumn { .. }
        )
    }
}

/// How a free-text filter edit should be dispatched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextFilterUpdate {
    /// Nothing to do
    Unchanged,
    /// Dispatch after the debounce quiet period
    Debounced(TableAction),
    /// Dispatch right away
    Immediate(TableAction),
}

/// Sort, filter, paging and visibility state of one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableState {
    /// Active sort criteria
    pub sort: Vec<SortRule>,
    /// Active filters, unique by id
    pub filter: Vec<FilterRule>,
    /// Zero-based page index
    pub page_index: u64,
    /// Rows per page
    pub page_size: u64,
    /// Hidden column ids
    pub hidden_columns: BTreeSet<String>,
}

impl Default for TableState {
    fn default() -> Self {
        Self::new(crate::pagination::DEFAULT_PAGE_SIZE)
    }
}

impl TableState {
    /// Empty state showing the first page of `page_size` rows
    #[must_use]
    pub fn new(page_size: u64) -> Self {
        Self {
            sort: Vec::new(),
            filter: Vec::new(),
            page_index: 0,
            page_size: page_size.max(1),
            hidden_columns: BTreeSet::new(),
        }
    }

    /// Set the initial sort
    #[must_use]
    pub fn with_sort(mut self, rule: SortRule) -> Self {
        self.sort = vec![rule];
        self
    }

    /// Apply `action`, returning the new state
    #[must_use]
    pub fn reduce(mut self, action: TableAction) -> Self {
        self.dispatch(action);
        self
    }

    /// Apply `action` in place
    pub fn dispatch(&mut self, action: TableAction) {
        tracing::trace!(?action, "Table action");
        let resets_page = action.changes_rows();

        match action {
            TableAction::FilterAdd { id, value } => match self.filter_mut(&id) {
                Some(rule) => rule.values.push(value),
                None => self.filter.push(FilterRule::new(id, vec![value])),
            },
            TableAction::FilterRemove { id, value } => {
                if let Some(rule) = self.filter_mut(&id) {
                    rule.values.retain(|v| *v != value);
                    if rule.values.is_empty() {
                        self.remove_filter(&id);
                    }
                }
            }
            TableAction::FilterReplace { id, values } => {
                if values.is_empty() {
                    self.remove_filter(&id);
                } else {
                    match self.filter_mut(&id) {
                        Some(rule) => rule.values = values,
                        None => self.filter.push(FilterRule::new(id, values)),
                    }
                }
            }
            TableAction::FilterClear { id } => self.remove_filter(&id),
            TableAction::ToggleSort { id } => {
                let order = match self.sort.as_slice() {
                    [current] if current.id == id => current.order.inverted(),
                    _ => SortOrder::Asc,
                };
                self.sort = vec![SortRule::new(id, order)];
            }
            TableAction::SetPageIndex { index } => self.page_index = index,
            TableAction::SetPageSize { size } => self.page_size = size.max(1),
            TableAction::ToggleHiddenColumn { id } => {
                if !self.hidden_columns.remove(&id) {
                    self.hidden_columns.insert(id);
                }
            }
        }

        if resets_page {
            self.page_index = 0;
        }
    }

    /// Values of filter `id`
    #[must_use]
    pub fn filter_values(&self, id: &str) -> Option<&[String]> {
        self.filter
            .iter()
            .find(|rule| rule.id == id)
            .map(|rule| rule.values.as_slice())
    }

    /// Whether column `id` is hidden
    #[must_use]
    pub fn is_hidden(&self, id: &str) -> bool {
        self.hidden_columns.contains(id)
    }

    /// Rows covered by the current page
    #[must_use]
    pub fn range(&self) -> RowRange {
        RowRange::for_page(self.page_index, self.page_size)
    }

    /// Collection query for the current state
    #[must_use]
    pub fn query(&self) -> CollectionQuery {
        CollectionQuery {
            range: Some(self.range()),
            sort: self.sort.clone(),
            filter: self.filter.clone(),
        }
    }

    /// Decide how a free-text filter edit is dispatched
    ///
    /// A non-empty input that differs from the current value is debounced;
    /// clearing the input removes the filter right away.
    #[must_use]
    pub fn text_filter_update(&self, id: &str, input: &str) -> TextFilterUpdate {
        let current = self
            .filter_values(id)
            .and_then(|values| values.first())
            .map(String::as_str);
        match (input.is_empty(), current) {
            (false, current) if current != Some(input) => {
                TextFilterUpdate::Debounced(TableAction::filter_replace(id, vec![input.to_string()]))
            }
            (true, Some(_)) => TextFilterUpdate::Immediate(TableAction::filter_clear(id)),
            _ => TextFilterUpdate::Unchanged,
        }
    }

    /// Query string persisting range, sort and filter
    ///
    /// # Errors
    ///
    /// Fails when a filter value contains a reserved delimiter.
    pub fn to_query_string(&self) -> Result<String, CodecError> {
        let params = self.query().to_params()?;
        Ok(build_query_string(&params))
    }

    /// Restore state from a query string written by [`TableState::to_query_string`]
    ///
    /// Parameters that fail to decode are logged and left at their defaults.
    #[must_use]
    pub fn from_query_string(search: &str, default_page_size: u64) -> Self {
        let params = parse_query_string(search);
        let mut state = Self::new(default_page_size);

        if let Some(raw) = params.first(SORT_PARAM) {
            match CollectionQuery::decode_sort(raw) {
                Ok(sort) => state.sort = sort,
                Err(err) => tracing::warn!(error = %err, "Ignoring sort parameter"),
            }
        }

        if let Some(raw) = params.first(FILTER_PARAM) {
            match CollectionQuery::decode_filter(raw) {
                Ok(filter) => {
                    for rule in filter {
                        state.dispatch(TableAction::filter_replace(rule.id, rule.values));
                    }
                }
                Err(err) => tracing::warn!(error = %err, "Ignoring filter parameter"),
            }
        }

        // Applied last, filter changes reset the page index
        if let Some(raw) = params.first(RANGE_PARAM) {
            match RowRange::decode(raw) {
                Ok(range) => {
                    state.page_size = range.len();
                    state.page_index = range.start() / range.len();
                }
                Err(err) => tracing::warn!(error = %err, "Ignoring range parameter"),
            }
        }

        state
    }

    fn filter_mut(&mut self, id: &str) -> Option<&mut FilterRule> {
        self.filter.iter_mut().find(|rule| rule.id == id)
    }

    fn remove_filter(&mut self, id: &str) {
        self.filter.retain(|rule| rule.id != id);
    }
}

/// Debouncer that forwards the latest action to `dispatch` once input settles
///
/// Used for free-text filters so a burst of keystrokes produces one request.
pub fn debounced_dispatch(
    dispatch: mpsc::UnboundedSender<TableAction>,
    quiet: Duration,
) -> Debouncer<TableAction> {
    Debouncer::spawn(quiet, move |action| {
        if dispatch.send(action).is_err() {
            tracing::debug!("Table closed before debounced action was dispatched");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(state: &TableState, id: &str) -> Vec<String> {
        state.filter_values(id).map(<[String]>::to_vec).unwrap_or_default()
    }

    #[test]
    fn test_filter_add_creates_then_appends() {
        let state = TableState::default()
            .reduce(TableAction::filter_add("status", "active"))
            .reduce(TableAction::filter_add("status", "terminated"));

        assert_eq!(state.filter.len(), 1);
        assert_eq!(
            state.filter[0],
            FilterRule::new("status", vec!["active".to_string(), "terminated".to_string()])
        );
    }

    #[test]
    fn test_filter_add_allows_duplicates() {
        let state = TableState::default()
            .reduce(TableAction::filter_add("status", "active"))
            .reduce(TableAction::filter_add("status", "active"));
        assert_eq!(values(&state, "status"), vec!["active", "active"]);
    }

    #[test]
    fn test_filter_remove_drops_empty_entry() {
        let state = TableState::default()
            .reduce(TableAction::filter_add("status", "active"))
            .reduce(TableAction::filter_add("status", "terminated"))
            .reduce(TableAction::filter_remove("status", "active"));
        assert_eq!(values(&state, "status"), vec!["terminated"]);

        let state = state.reduce(TableAction::filter_remove("status", "terminated"));
        assert!(state.filter_values("status").is_none());
        assert!(state.filter.is_empty());
    }

    #[test]
    fn test_filter_remove_unknown_is_noop() {
        let state = TableState::default().reduce(TableAction::filter_add("status", "active"));
        let after = state.clone().reduce(TableAction::filter_remove("tag", "LP"));
        assert_eq!(after.filter, state.filter);
    }

    #[test]
    fn test_filter_replace_is_idempotent() {
        let action = TableAction::filter_replace("customer", vec!["surf".to_string()]);
        let once = TableState::default()
            .reduce(TableAction::filter_add("customer", "old"))
            .reduce(action.clone());
        let twice = once.clone().reduce(action);
        assert_eq!(once, twice);
        assert_eq!(values(&once, "customer"), vec!["surf"]);
    }

    #[test]
    fn test_filter_replace_with_nothing_clears() {
        let state = TableState::default()
            .reduce(TableAction::filter_add("status", "active"))
            .reduce(TableAction::filter_replace("status", Vec::new()));
        assert!(state.filter.is_empty());
    }

    #[test]
    fn test_filter_clear_is_idempotent() {
        let state = TableState::default().reduce(TableAction::filter_add("status", "active"));
        let once = state.reduce(TableAction::filter_clear("status"));
        let twice = once.clone().reduce(TableAction::filter_clear("status"));
        assert!(once.filter.is_empty());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_filters_are_independent() {
        let base = TableState::default()
            .reduce(TableAction::filter_add("organisation", "abc"))
            .reduce(TableAction::filter_add("status", "active"));

        for action in [
            TableAction::filter_add("status", "terminated"),
            TableAction::filter_remove("status", "active"),
            TableAction::filter_replace("status", vec!["initial".to_string()]),
            TableAction::filter_clear("status"),
        ] {
            let after = base.clone().reduce(action);
            assert_eq!(values(&after, "organisation"), vec!["abc"]);
        }
    }

    #[test]
    fn test_toggle_sort() {
        let state = TableState::default().reduce(TableAction::toggle_sort("name"));
        assert_eq!(state.sort, vec![SortRule::asc("name")]);

        let state = state.reduce(TableAction::toggle_sort("name"));
        assert_eq!(state.sort, vec![SortRule::desc("name")]);

        let state = state.reduce(TableAction::toggle_sort("status"));
        assert_eq!(state.sort, vec![SortRule::asc("status")]);
    }

    #[test]
    fn test_toggle_sort_with_multiple_rules_resets() {
        let mut state = TableState::default();
        state.sort = vec![SortRule::desc("name"), SortRule::asc("status")];
        let state = state.reduce(TableAction::toggle_sort("name"));
        assert_eq!(state.sort, vec![SortRule::asc("name")]);
    }

    #[test]
    fn test_changes_reset_page_index() {
        let state = TableState::new(10).reduce(TableAction::SetPageIndex { index: 4 });
        assert_eq!(state.page_index, 4);

        let hidden = state.clone().reduce(TableAction::ToggleHiddenColumn { id: "tag".into() });
        assert_eq!(hidden.page_index, 4);

        let filtered = state.clone().reduce(TableAction::filter_add("status", "active"));
        assert_eq!(filtered.page_index, 0);

        let resized = state.reduce(TableAction::SetPageSize { size: 50 });
        assert_eq!((resized.page_index, resized.page_size), (0, 50));
    }

    #[test]
    fn test_toggle_hidden_column() {
        let state = TableState::default().reduce(TableAction::ToggleHiddenColumn { id: "tag".into() });
        assert!(state.is_hidden("tag"));
        let state = state.reduce(TableAction::ToggleHiddenColumn { id: "tag".into() });
        assert!(!state.is_hidden("tag"));
    }

    #[test]
    fn test_query_reflects_state() {
        let state = TableState::new(10)
            .with_sort(SortRule::desc("start_date"))
            .reduce(TableAction::filter_add("status", "active"))
            .reduce(TableAction::SetPageIndex { index: 2 });

        let query = state.query();
        assert_eq!(query.range, RowRange::new(20, 29));
        assert_eq!(query.sort, vec![SortRule::desc("start_date")]);
        assert_eq!(query.filter.len(), 1);
    }

    #[test]
    fn test_text_filter_update() {
        let state = TableState::default();
        assert_eq!(
            state.text_filter_update("customer", "sur"),
            TextFilterUpdate::Debounced(TableAction::filter_replace("customer", vec!["sur".into()]))
        );
        assert_eq!(state.text_filter_update("customer", ""), TextFilterUpdate::Unchanged);

        let state = state.reduce(TableAction::filter_replace("customer", vec!["surf".into()]));
        assert_eq!(state.text_filter_update("customer", "surf"), TextFilterUpdate::Unchanged);
        assert_eq!(
            state.text_filter_update("customer", ""),
            TextFilterUpdate::Immediate(TableAction::filter_clear("customer"))
        );
    }

    #[test]
    fn test_hyphenated_filter_replace() {
        let uuid = "2f47f65a-0911-e511-80d0-005056956c1a";
        let state = TableState::default()
            .reduce(TableAction::filter_replace_hyphenated("organisation", uuid));
        assert_eq!(state.filter[0].joined_values(), uuid);
        assert!(state.to_query_string().is_ok());
    }

    #[test]
    fn test_query_string_round_trip() {
        let state = TableState::new(25)
            .with_sort(SortRule::desc("start_date"))
            .reduce(TableAction::filter_add("status", "active"))
            .reduce(TableAction::filter_add("status", "terminated"))
            .reduce(TableAction::filter_replace_hyphenated("organisation", "2f47f65a-0911"))
            .reduce(TableAction::SetPageIndex { index: 3 });

        let search = state.to_query_string().unwrap();
        assert_eq!(
            search,
            "?range=75%2C99&sort=start_date%2Cdesc&filter=status%2Cactive-terminated%2Corganisation%2C2f47f65a-0911"
        );

        let restored = TableState::from_query_string(&search, 10);
        assert_eq!(restored.page_index, 3);
        assert_eq!(restored.page_size, 25);
        assert_eq!(restored.sort, state.sort);
        assert_eq!(restored.filter, state.filter);
    }

    #[test]
    fn test_from_query_string_ignores_bad_params() {
        let restored = TableState::from_query_string("?range=9,1&sort=name&filter=status,active", 10);
        assert_eq!(restored.page_size, 10);
        assert_eq!(restored.page_index, 0);
        assert!(restored.sort.is_empty());
        assert_eq!(values(&restored, "status"), vec!["active"]);
    }

    #[test]
    fn test_action_serde_tag() {
        let json = serde_json::to_value(TableAction::filter_clear("status")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "FILTER_CLEAR", "id": "status"}));
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounced_filter_replace_dispatches_latest_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let debouncer = debounced_dispatch(tx, Duration::from_millis(300));

        debouncer.push(TableAction::filter_replace("customer", vec!["su".into()]));
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.push(TableAction::filter_replace("customer", vec!["surf".into()]));

        let action = rx.recv().await.unwrap();
        assert_eq!(action, TableAction::filter_replace("customer", vec!["surf".into()]));

        let more = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
        assert!(more.is_err());
    }
}
