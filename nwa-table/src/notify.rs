//! User-visible notifications
//!
//! Failed collection requests raise a transient notification naming the
//! failing URL and status. The [`Notifier`] trait decouples the client from how
//! notifications are shown: [`NotificationCenter`] fans them out to any number
//! of subscribers (a toast area, a status bar, a CLI), [`TracingNotifier`]
//! simply logs them.
//!
//! # Example
//!
//! ```rust
//! use nwa_table::notify::{Notification, NotificationCenter, Notifier};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let center = NotificationCenter::new();
//! let mut toasts = center.subscribe();
//!
//! center.notify(Notification::error("subscriptions returned with HTTP status 500"));
//! let received = toasts.recv().await.unwrap();
//! assert_eq!(received.message, "subscriptions returned with HTTP status 500");
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 64;

/// Notification severity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Operation succeeded
    Success,
    /// Informational
    Info,
    /// Something needs attention
    Warning,
    /// Operation failed
    Error,
}

impl NotificationKind {
    /// CSS class used when rendering the notification
    #[must_use]
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Success => "flash-success",
            Self::Info => "flash-info",
            Self::Warning => "flash-warning",
            Self::Error => "flash-error",
        }
    }
}

/// A single notification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    /// Severity
    pub kind: NotificationKind,
    /// Text shown to the user
    pub message: String,
    /// When it was raised
    pub raised_at: DateTime<Utc>,
}

impl Notification {
    /// Create a notification stamped with the current time
    #[must_use]
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            raised_at: Utc::now(),
        }
    }

    /// Success notification
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, message)
    }

    /// Info notification
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, message)
    }

    /// Warning notification
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, message)
    }

    /// Error notification
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message)
    }
}

/// Sink for user-visible notifications
pub trait Notifier: Send + Sync {
    /// Show `notification` to the user
    fn notify(&self, notification: Notification);
}

/// Logs notifications through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Error => tracing::error!(message = %notification.message, "notification"),
            NotificationKind::Warning => tracing::warn!(message = %notification.message, "notification"),
            NotificationKind::Success | NotificationKind::Info => {
                tracing::info!(message = %notification.message, "notification");
            }
        }
    }
}

/// Broadcasts notifications to every subscriber
///
/// Notifications raised while nobody is subscribed are dropped.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    sender: broadcast::Sender<Notification>,
}

impl NotificationCenter {
    /// Create a center with the default buffer
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a center buffering up to `capacity` notifications per subscriber
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receive subsequent notifications
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Number of active subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, notification: Notification) {
        if self.sender.send(notification).is_err() {
            tracing::debug!("Notification dropped, no subscribers");
        }
    }
}
