//! Filterable-collection client
//!
//! Performs conditional, paged, sorted and filtered GET requests against a
//! collection endpoint and normalises the outcome into a [`Page`].
//!
//! - `200` yields [`PageBody::Rows`] decoded from the JSON array body.
//! - `304` yields [`PageBody::NotModified`]; the caller keeps the rows it
//!   already has.
//! - Any other status is a [`FetchError::Status`] carrying the raw response.
//!
//! Total row count comes from `Content-Range` (`items 0-9/42`) and is `None`
//! when the header is missing or unparseable. The ETag is stored without its
//! weak prefix and quotes.
//!
//! Every failure except cancellation raises an error notification through the
//! client's [`Notifier`]. Nothing is retried.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use nwa_table::cancel::CancelScope;
//! use nwa_table::client::CollectionClient;
//! use nwa_table::config::Config;
//! use nwa_table::notify::TracingNotifier;
//! use nwa_table::query::{CollectionQuery, RowRange, SortRule};
//!
//! # async fn run() -> nwa_table::error::Result<()> {
//! let config = Config::load()?;
//! let client = CollectionClient::new(&config.api, Arc::new(TracingNotifier))?;
//! let scope = CancelScope::new();
//!
//! let query = CollectionQuery::new()
//!     .with_range(RowRange::for_page(0, 25))
//!     .with_sort(SortRule::desc("start_date"));
//! let page = client
//!     .fetch_page::<serde_json::Value>("subscriptions", &query, None, &scope)
//!     .await?;
//! println!("{:?} rows of {:?}", page.rows().map(<[_]>::len), page.total);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use http::{header, HeaderMap, StatusCode};
use reqwest::Url;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::cancel::{CancelScope, Cancelled};
use crate::codec::CodecError;
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::notify::{Notification, Notifier};
use crate::query::CollectionQuery;

/// Why a collection request failed
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request's scope was cancelled; not a fault
    #[error("request to {url} was cancelled")]
    Cancelled {
        /// Requested URL
        url: String,
    },

    /// The server answered with a status other than 200 or 304
    #[error("{url} returned with HTTP status {}: {reason}", status.as_u16())]
    Status {
        /// Requested URL
        url: String,
        /// Response status
        status: StatusCode,
        /// Canonical reason phrase, empty when unknown
        reason: String,
        /// Response headers
        headers: HeaderMap,
        /// Raw response body
        body: String,
    },

    /// No response was received
    #[error("{url} failed: {source}")]
    Transport {
        /// Requested URL
        url: String,
        /// Underlying transport error
        #[source]
        source: reqwest::Error,
    },

    /// The 200 body was not a JSON array of rows
    #[error("{url} returned an unreadable body: {source}")]
    Decode {
        /// Requested URL
        url: String,
        /// Underlying decoding error
        #[source]
        source: reqwest::Error,
    },

    /// The query could not be encoded
    #[error("invalid query for {url}: {source}")]
    InvalidQuery {
        /// Requested URL
        url: String,
        /// Encoding failure
        #[source]
        source: CodecError,
    },

    /// The collection path does not form a valid URL
    #[error("invalid collection path '{path}'")]
    InvalidPath {
        /// Offending path
        path: String,
    },
}

impl FetchError {
    /// Whether this reflects caller-initiated cancellation
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Response status, when a response was received
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Rows of a page, or a marker that the cached rows are still current
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageBody<T> {
    /// Fresh rows
    Rows(Vec<T>),
    /// The server reported no change for the supplied ETag
    NotModified,
}

/// Normalised collection response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Rows or not-modified marker
    pub body: PageBody<T>,
    /// Total matching rows, `None` when the server did not say
    pub total: Option<u64>,
    /// Validator for this response, without weak prefix or quotes
    pub etag: Option<String>,
}

impl<T> Page<T> {
    /// Fresh rows, if any
    #[must_use]
    pub fn rows(&self) -> Option<&[T]> {
        match &self.body {
            PageBody::Rows(rows) => Some(rows),
            PageBody::NotModified => None,
        }
    }

    /// Whether the server answered 304
    #[must_use]
    pub fn is_not_modified(&self) -> bool {
        matches!(self.body, PageBody::NotModified)
    }
}

/// Total row count from a `Content-Range` header
///
/// ```rust
/// use http::{header, HeaderMap, HeaderValue};
/// use nwa_table::client::extract_total;
///
/// let mut headers = HeaderMap::new();
/// headers.insert(header::CONTENT_RANGE, HeaderValue::from_static("items 0-9/42"));
/// assert_eq!(extract_total(&headers), Some(42));
/// ```
#[must_use]
pub fn extract_total(headers: &HeaderMap) -> Option<u64> {
    let raw = headers.get(header::CONTENT_RANGE)?.to_str().ok()?;
    let (_, total) = raw.rsplit_once('/')?;
    total.trim().parse().ok()
}

/// ETag from response headers, with `W/` prefix and quotes removed
#[must_use]
pub fn extract_etag(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::ETAG)?.to_str().ok()?;
    normalize_etag(raw)
}

/// Strip the weak-validator prefix and surrounding quotes from an ETag
#[must_use]
pub fn normalize_etag(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let raw = raw.strip_prefix("W/").unwrap_or(raw);
    let raw = raw
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(raw);
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

/// `If-None-Match` value for a stored ETag
fn quote_etag(etag: &str) -> String {
    if etag.starts_with('"') || etag.starts_with("W/") {
        etag.to_string()
    } else {
        format!("\"{etag}\"")
    }
}

/// Join the backend origin and API prefix into a base URL ending in `/`
fn base_url(config: &ApiConfig) -> Result<Url> {
    let origin = config.backend_url.trim_end_matches('/');
    let prefix = config.api_prefix.trim_matches('/');
    let joined = if prefix.is_empty() {
        format!("{origin}/")
    } else {
        format!("{origin}/{prefix}/")
    };
    Url::parse(&joined).map_err(|e| Error::InvalidUrl(format!("{joined}: {e}")))
}

/// Client for filterable collection endpoints
#[derive(Clone)]
pub struct CollectionClient {
    http: reqwest::Client,
    base_url: Url,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for CollectionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl CollectionClient {
    /// Create a client from API configuration
    pub fn new(config: &ApiConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url(config)?,
            notifier,
        })
    }

    /// Base URL that collection paths are resolved against
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a collection path against the base URL
    pub fn endpoint(&self, path: &str) -> std::result::Result<Url, FetchError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|_| FetchError::InvalidPath {
                path: path.to_string(),
            })
    }

    /// Fetch one page of `path`
    ///
    /// `etag`, when given, is sent as `If-None-Match`. The request is aborted
    /// if `scope` is cancelled before it completes.
    ///
    /// # Errors
    ///
    /// See [`FetchError`]. All variants except [`FetchError::Cancelled`] have
    /// already been reported to the notifier when this returns.
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &CollectionQuery,
        etag: Option<&str>,
        scope: &CancelScope,
    ) -> std::result::Result<Page<T>, FetchError> {
        let result = match self.endpoint(path) {
            Ok(url) => self.execute(url, query, etag, scope).await,
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            self.report(err);
        }
        result
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &CollectionQuery,
        etag: Option<&str>,
        scope: &CancelScope,
    ) -> std::result::Result<Page<T>, FetchError> {
        let url_text = url.to_string();
        let params = query.to_params().map_err(|source| FetchError::InvalidQuery {
            url: url_text.clone(),
            source,
        })?;

        let mut request = self.http.get(url).query(&params);
        if let Some(etag) = etag {
            request = request.header(header::IF_NONE_MATCH, quote_etag(etag));
        }

        tracing::debug!(url = %url_text, ?params, etag, "Fetching collection page");

        let response = match scope.run(request.send()).await {
            Err(Cancelled) => return Err(FetchError::Cancelled { url: url_text }),
            Ok(Err(source)) => {
                return Err(FetchError::Transport {
                    url: url_text,
                    source,
                })
            }
            Ok(Ok(response)) => response,
        };

        let status = response.status();
        let total = extract_total(response.headers());
        let etag = extract_etag(response.headers());

        if status == StatusCode::NOT_MODIFIED {
            tracing::debug!(url = %url_text, "Collection page not modified");
            return Ok(Page {
                body: PageBody::NotModified,
                total,
                etag,
            });
        }

        if status != StatusCode::OK {
            let headers = response.headers().clone();
            let body = match scope.run(response.text()).await {
                Err(Cancelled) => return Err(FetchError::Cancelled { url: url_text }),
                Ok(Ok(body)) => body,
                Ok(Err(_)) => String::new(),
            };
            return Err(FetchError::Status {
                url: url_text,
                status,
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                headers,
                body,
            });
        }

        let rows = match scope.run(response.json::<Vec<T>>()).await {
            Err(Cancelled) => return Err(FetchError::Cancelled { url: url_text }),
            Ok(Err(source)) => {
                return Err(FetchError::Decode {
                    url: url_text,
                    source,
                })
            }
            Ok(Ok(rows)) => rows,
        };
        tracing::debug!(url = %url_text, rows = rows.len(), ?total, "Collection page received");
        Ok(Page {
            body: PageBody::Rows(rows),
            total,
            etag,
        })
    }

    fn report(&self, err: &FetchError) {
        if err.is_cancelled() {
            tracing::debug!(error = %err, "Collection request cancelled");
            return;
        }
        tracing::warn!(error = %err, "Collection request failed");
        self.notifier.notify(Notification::error(err.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::notify::{NotificationCenter, NotificationKind};
    use crate::query::{FilterRule, RowRange, SortRule};
    use axum::{
        extract::{Query, State},
        http::HeaderValue,
        response::{IntoResponse, Response},
        routing::get,
        Json, Router,
    };
    use serde::Deserialize;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::broadcast::error::TryRecvError;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        id: u32,
        name: String,
    }

    type Seen = Arc<Mutex<Vec<(HashMap<String, String>, Option<String>)>>>;

    async fn subscriptions(
        State(seen): State<Seen>,
        Query(params): Query<HashMap<String, String>>,
        headers: axum::http::HeaderMap,
    ) -> Response {
        let if_none_match = headers
            .get(header::IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        seen.lock().unwrap().push((params, if_none_match.clone()));

        let validators = [
            (header::ETAG, "W/\"abc\""),
            (header::CONTENT_RANGE, "items 0-9/42"),
        ];
        if if_none_match.as_deref() == Some("\"abc\"") {
            return (StatusCode::NOT_MODIFIED, validators).into_response();
        }
        (
            validators,
            Json(serde_json::json!([
                {"id": 1, "name": "LP 1"},
                {"id": 2, "name": "LP 2"}
            ])),
        )
            .into_response()
    }

    async fn spawn_backend() -> (String, Seen) {
        let seen: Seen = Arc::default();
        let app = Router::new()
            .route("/api/subscriptions", get(subscriptions))
            .route(
                "/api/broken",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database on fire") }),
            )
            .route("/api/garbage", get(|| async { "not json" }))
            .route(
                "/api/untotalled",
                get(|| async { Json(serde_json::json!([{"id": 3, "name": "IP"}])) }),
            )
            .route(
                "/api/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Json(serde_json::json!([]))
                }),
            )
            .with_state(seen.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), seen)
    }

    fn client_for(backend: &str, center: &NotificationCenter) -> CollectionClient {
        let config = ApiConfig {
            backend_url: backend.to_string(),
            ..Config::default().api
        };
        CollectionClient::new(&config, Arc::new(center.clone())).unwrap()
    }

    fn headers(pairs: &[(header::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_extract_total_and_weak_etag() {
        let map = headers(&[
            (header::ETAG, "W/\"abc\""),
            (header::CONTENT_RANGE, "items 0-9/42"),
        ]);
        assert_eq!(extract_total(&map), Some(42));
        assert_eq!(extract_etag(&map), Some("abc".to_string()));
    }

    #[test]
    fn test_extract_strong_etag() {
        let map = headers(&[(header::ETAG, "\"v1\"")]);
        assert_eq!(extract_etag(&map), Some("v1".to_string()));
    }

    #[test]
    fn test_missing_or_malformed_total_is_unknown() {
        assert_eq!(extract_total(&HeaderMap::new()), None);
        assert_eq!(extract_total(&headers(&[(header::CONTENT_RANGE, "items 0-9/*")])), None);
        assert_eq!(extract_total(&headers(&[(header::CONTENT_RANGE, "items 0-9")])), None);
    }

    #[test]
    fn test_normalize_etag_edge_cases() {
        assert_eq!(normalize_etag("plain"), Some("plain".to_string()));
        assert_eq!(normalize_etag("W/\"\""), None);
        assert_eq!(normalize_etag(""), None);
    }

    #[test]
    fn test_quote_etag() {
        assert_eq!(quote_etag("abc"), "\"abc\"");
        assert_eq!(quote_etag("\"abc\""), "\"abc\"");
        assert_eq!(quote_etag("W/\"abc\""), "W/\"abc\"");
    }

    #[test]
    fn test_base_url_joins_prefix() {
        let mut config = Config::default().api;
        config.backend_url = "https://orchestrator.example.net/".to_string();
        config.api_prefix = "/api/".to_string();
        assert_eq!(
            base_url(&config).unwrap().as_str(),
            "https://orchestrator.example.net/api/"
        );

        config.api_prefix = String::new();
        assert_eq!(
            base_url(&config).unwrap().as_str(),
            "https://orchestrator.example.net/"
        );

        config.backend_url = "not a url".to_string();
        assert!(base_url(&config).is_err());
    }

    #[tokio::test]
    async fn test_fetch_fresh_page() {
        let (backend, seen) = spawn_backend().await;
        let center = NotificationCenter::new();
        let client = client_for(&backend, &center);
        let scope = CancelScope::new();

        let query = CollectionQuery::new()
            .with_range(RowRange::for_page(0, 10))
            .with_sort(SortRule::desc("start_date"))
            .with_filter(FilterRule::new(
                "status",
                vec!["active".to_string(), "terminated".to_string()],
            ));
        let page: Page<Row> = client
            .fetch_page("subscriptions", &query, None, &scope)
            .await
            .unwrap();

        assert_eq!(page.total, Some(42));
        assert_eq!(page.etag.as_deref(), Some("abc"));
        assert_eq!(
            page.rows().unwrap(),
            &[
                Row { id: 1, name: "LP 1".to_string() },
                Row { id: 2, name: "LP 2".to_string() },
            ]
        );

        let seen = seen.lock().unwrap();
        let (params, if_none_match) = &seen[0];
        assert_eq!(params.get("range").map(String::as_str), Some("0,9"));
        assert_eq!(params.get("sort").map(String::as_str), Some("start_date,desc"));
        assert_eq!(
            params.get("filter").map(String::as_str),
            Some("status,active-terminated")
        );
        assert!(if_none_match.is_none());
    }

    #[tokio::test]
    async fn test_empty_query_sends_no_params() {
        let (backend, seen) = spawn_backend().await;
        let center = NotificationCenter::new();
        let client = client_for(&backend, &center);
        let scope = CancelScope::new();

        let _: Page<Row> = client
            .fetch_page("/subscriptions", &CollectionQuery::new(), None, &scope)
            .await
            .unwrap();
        assert!(seen.lock().unwrap()[0].0.is_empty());
    }

    #[tokio::test]
    async fn test_matching_etag_is_not_modified() {
        let (backend, seen) = spawn_backend().await;
        let center = NotificationCenter::new();
        let client = client_for(&backend, &center);
        let scope = CancelScope::new();

        let page: Page<Row> = client
            .fetch_page("subscriptions", &CollectionQuery::new(), Some("abc"), &scope)
            .await
            .unwrap();

        assert!(page.is_not_modified());
        assert!(page.rows().is_none());
        assert_eq!(page.total, Some(42));
        assert_eq!(page.etag.as_deref(), Some("abc"));
        assert_eq!(seen.lock().unwrap()[0].1.as_deref(), Some("\"abc\""));
    }

    #[tokio::test]
    async fn test_missing_content_range_leaves_total_unknown() {
        let (backend, _) = spawn_backend().await;
        let center = NotificationCenter::new();
        let client = client_for(&backend, &center);
        let scope = CancelScope::new();

        let page: Page<Row> = client
            .fetch_page("untotalled", &CollectionQuery::new(), None, &scope)
            .await
            .unwrap();
        assert_eq!(page.total, None);
        assert_eq!(page.etag, None);
        assert_eq!(page.rows().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_error_status_is_surfaced_and_notified() {
        let (backend, _) = spawn_backend().await;
        let center = NotificationCenter::new();
        let mut toasts = center.subscribe();
        let client = client_for(&backend, &center);
        let scope = CancelScope::new();

        let err = client
            .fetch_page::<Row>("broken", &CollectionQuery::new(), None, &scope)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        match &err {
            FetchError::Status { body, reason, .. } => {
                assert_eq!(body, "database on fire");
                assert_eq!(reason, "Internal Server Error");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let toast = toasts.recv().await.unwrap();
        assert_eq!(toast.kind, NotificationKind::Error);
        assert_eq!(
            toast.message,
            format!("{backend}/api/broken returned with HTTP status 500: Internal Server Error")
        );
    }

    #[tokio::test]
    async fn test_undecodable_body_is_decode_error() {
        let (backend, _) = spawn_backend().await;
        let center = NotificationCenter::new();
        let mut toasts = center.subscribe();
        let client = client_for(&backend, &center);
        let scope = CancelScope::new();

        let err = client
            .fetch_page::<Row>("garbage", &CollectionQuery::new(), None, &scope)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
        assert!(toasts.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_transport_failure_is_notified() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let center = NotificationCenter::new();
        let mut toasts = center.subscribe();
        let client = client_for(&format!("http://{addr}"), &center);
        let scope = CancelScope::new();

        let err = client
            .fetch_page::<Row>("subscriptions", &CollectionQuery::new(), None, &scope)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
        assert!(toasts.recv().await.unwrap().message.contains("failed"));
    }

    #[tokio::test]
    async fn test_invalid_filter_fails_before_sending() {
        let (backend, seen) = spawn_backend().await;
        let center = NotificationCenter::new();
        let client = client_for(&backend, &center);
        let scope = CancelScope::new();

        let query = CollectionQuery::new().with_filter(FilterRule::new(
            "organisation",
            vec!["2f47f65a-0911".to_string()],
        ));
        let err = client
            .fetch_page::<Row>("subscriptions", &query, None, &scope)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidQuery { .. }));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_is_silent() {
        let (backend, _) = spawn_backend().await;
        let center = NotificationCenter::new();
        let mut toasts = center.subscribe();
        let client = client_for(&backend, &center);
        let view_scope = CancelScope::new();
        let request_scope = view_scope.child();

        let canceller = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            view_scope.cancel();
        };
        let query = CollectionQuery::new();
        let (result, ()) = tokio::join!(
            client.fetch_page::<Row>("slow", &query, None, &request_scope),
            canceller
        );

        let err = result.unwrap_err();
        assert!(err.is_cancelled());
        assert!(matches!(toasts.try_recv(), Err(TryRecvError::Empty)));
    }

    async fn spawn_stalled_error_backend() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            socket
                .write_all(b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 64\r\n\r\npartial")
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_cancellation_while_reading_error_body_is_silent() {
        let backend = spawn_stalled_error_backend().await;
        let center = NotificationCenter::new();
        let mut toasts = center.subscribe();
        let client = client_for(&backend, &center);
        let scope = CancelScope::new();
        let query = CollectionQuery::new();

        let canceller = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            scope.cancel();
        };
        let (result, ()) = tokio::join!(
            client.fetch_page::<Row>("subscriptions", &query, None, &scope),
            canceller
        );

        let err = result.unwrap_err();
        assert!(err.is_cancelled());
        assert!(err.status().is_none());
        assert!(matches!(toasts.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_cancelling_one_view_leaves_another_alone() {
        let (backend, _) = spawn_backend().await;
        let center = NotificationCenter::new();
        let client = client_for(&backend, &center);
        let cancelled_view = CancelScope::new();
        let live_view = CancelScope::new();
        cancelled_view.cancel();

        let err = client
            .fetch_page::<Row>("subscriptions", &CollectionQuery::new(), None, &cancelled_view)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());

        let page = client
            .fetch_page::<Row>("subscriptions", &CollectionQuery::new(), None, &live_view)
            .await
            .unwrap();
        assert_eq!(page.rows().unwrap().len(), 2);
    }
}
