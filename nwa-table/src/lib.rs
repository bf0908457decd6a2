//! # nwa-table
//!
//! Client-side table layer for a network automation admin front-end: shows
//! server-side collections (subscriptions, processes, products) as sortable,
//! filterable, paginated tables.
//!
//! ## Features
//!
//! - **Query-string codec**: range, sort and filter parameters that round-trip
//!   through the address bar
//! - **Conditional fetches**: `If-None-Match` revalidation, `Content-Range`
//!   totals, `304 Not Modified` handling
//! - **Cancellation**: per-view scopes abort superseded and abandoned requests
//! - **Table state**: a pure reducer over sort, filter, paging and column
//!   visibility actions
//! - **Debouncing** of free-text filter input
//! - **Notifications** for failed requests
//!
//! ## Example
//!
//! ```rust,no_run
//! use nwa_table::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(serde::Deserialize)]
//! struct Subscription {
//!     subscription_id: String,
//!     description: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let client = CollectionClient::new(&config.api, Arc::new(TracingNotifier))?;
//!     let mut view = CollectionView::<Subscription>::new(TableState::new(config.table.default_page_size));
//!
//!     view.dispatch(TableAction::filter_add("status", "active"));
//!     view.refresh(&client, "subscriptions").await;
//!
//!     for row in view.rows() {
//!         println!("{} {}", row.subscription_id, row.description);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod client;
pub mod codec;
pub mod config;
pub mod debounce;
pub mod error;
pub mod notify;
pub mod observability;
pub mod pagination;
pub mod query;
pub mod table;
pub mod view;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancel::{CancelScope, Cancelled};
    pub use crate::client::{CollectionClient, FetchError, Page, PageBody};
    pub use crate::codec::{get_parameter_by_name, parse_query_string, CodecError, QueryParams};
    pub use crate::config::{ApiConfig, Config, TableConfig};
    pub use crate::debounce::Debouncer;
    pub use crate::error::{Error, Result};
    pub use crate::notify::{Notification, NotificationCenter, NotificationKind, Notifier, TracingNotifier};
    pub use crate::observability::{init_tracing, shutdown_tracing};
    pub use crate::pagination::{Paginator, PAGE_SIZE_OPTIONS};
    pub use crate::query::{CollectionQuery, FilterRule, RowRange, SortOrder, SortRule};
    pub use crate::table::{TableAction, TableState, TextFilterUpdate};
    pub use crate::view::{ApplyOutcome, CollectionView, PendingRequest};
}
