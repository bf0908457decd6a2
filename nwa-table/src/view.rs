//! Collection view synchronisation
//!
//! A [`CollectionView`] ties a [`TableState`] to the rows last fetched for it.
//! Each state change triggers a new request; the view makes sure that only the
//! response for the latest request is ever shown, that a superseded request is
//! cancelled, and that an unchanged collection (HTTP 304) keeps the rows it
//! already has.
//!
//! Requests can be driven in one step with [`CollectionView::refresh`], or split
//! into [`CollectionView::begin_request`] and [`CollectionView::apply`] when the
//! fetch runs elsewhere (for example in a spawned task while the view keeps
//! accepting input).

use crate::cancel::CancelScope;
use crate::client::{CollectionClient, FetchError, Page, PageBody};
use crate::pagination::Paginator;
use crate::query::CollectionQuery;
use crate::table::{TableAction, TableState};

use serde::de::DeserializeOwned;

/// A request started by [`CollectionView::begin_request`]
#[derive(Debug)]
pub struct PendingRequest {
    generation: u64,
    /// Query to send
    pub query: CollectionQuery,
    /// ETag for `If-None-Match`, present only when the cached rows belong to `query`
    pub etag: Option<String>,
    /// Scope to run the request under
    pub scope: CancelScope,
}

/// What [`CollectionView::apply`] did with a response
#[derive(Debug)]
pub enum ApplyOutcome {
    /// New rows replaced the cache
    Applied,
    /// The collection was unchanged; cached rows kept
    NotModified,
    /// The response was for a superseded request and was ignored
    Discarded,
    /// The request failed; cached rows kept
    Failed(FetchError),
}

/// Rows and table state for one displayed collection
///
/// Dropping the view cancels every request still running for it.
#[derive(Debug)]
pub struct CollectionView<T> {
    state: TableState,
    rows: Vec<T>,
    total: Option<u64>,
    etag: Option<String>,
    loaded_query: Option<CollectionQuery>,
    generation: u64,
    loading: bool,
    in_flight: Option<CancelScope>,
    scope: CancelScope,
}

impl<T> CollectionView<T> {
    /// Create an empty view
    #[must_use]
    pub fn new(state: TableState) -> Self {
        Self {
            state,
            rows: Vec::new(),
            total: None,
            etag: None,
            loaded_query: None,
            generation: 0,
            loading: false,
            in_flight: None,
            scope: CancelScope::new(),
        }
    }

    /// Current table state
    #[must_use]
    pub fn state(&self) -> &TableState {
        &self.state
    }

    /// Rows for the last applied response
    #[must_use]
    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    /// Total reported by the backend, if any
    #[must_use]
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Validator of the cached rows
    #[must_use]
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    /// Whether a request is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Paging controls for the current state
    #[must_use]
    pub fn paginator(&self) -> Paginator {
        Paginator::new(self.state.page_index, self.state.page_size, self.total)
    }

    /// Apply a table action; the caller should follow up with a new request
    pub fn dispatch(&mut self, action: TableAction) {
        self.state.dispatch(action);
    }

    /// Start a request for the current state, cancelling any in-flight one
    pub fn begin_request(&mut self) -> PendingRequest {
        self.generation += 1;
        self.loading = true;

        let request_scope = self.scope.child();
        let scope = request_scope.child();
        // Dropping the previous scope cancels the superseded request
        self.in_flight = Some(request_scope);

        let query = self.state.query();
        let etag = if self.loaded_query.as_ref() == Some(&query) {
            self.etag.clone()
        } else {
            None
        };

        tracing::debug!(generation = self.generation, conditional = etag.is_some(), "Starting collection request");

        PendingRequest {
            generation: self.generation,
            query,
            etag,
            scope,
        }
    }

    /// Apply the result of `pending`
    ///
    /// Results for superseded requests, or for a query the state has since
    /// moved away from, are discarded.
    pub fn apply(&mut self, pending: PendingRequest, result: Result<Page<T>, FetchError>) -> ApplyOutcome {
        if pending.generation != self.generation {
            tracing::debug!(generation = pending.generation, latest = self.generation, "Discarding superseded response");
            return ApplyOutcome::Discarded;
        }

        // Latest request has settled
        self.loading = false;
        self.in_flight = None;

        if pending.query != self.state.query() {
            tracing::debug!(generation = pending.generation, "Discarding response for outdated query");
            return ApplyOutcome::Discarded;
        }

        let page = match result {
            Ok(page) => page,
            Err(err) if err.is_cancelled() => return ApplyOutcome::Discarded,
            Err(err) => return ApplyOutcome::Failed(err),
        };

        match page.body {
            PageBody::Rows(rows) => {
                self.rows = rows;
                self.total = page.total;
                self.etag = page.etag;
                self.loaded_query = Some(pending.query);
                ApplyOutcome::Applied
            }
            PageBody::NotModified => {
                if page.total.is_some() {
                    self.total = page.total;
                }
                if page.etag.is_some() {
                    self.etag = page.etag;
                }
                ApplyOutcome::NotModified
            }
        }
    }

    /// Cancel the in-flight request, if any
    pub fn cancel(&mut self) {
        if let Some(scope) = self.in_flight.take() {
            scope.cancel();
        }
        self.loading = false;
    }
}

impl<T: DeserializeOwned> CollectionView<T> {
    /// Fetch `path` for the current state and apply the result
    pub async fn refresh(&mut self, client: &CollectionClient, path: &str) -> ApplyOutcome {
        let pending = self.begin_request();
        let result = client
            .fetch_page(path, &pending.query, pending.etag.as_deref(), &pending.scope)
            .await;
        self.apply(pending, result)
    }
}
