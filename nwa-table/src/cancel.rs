//! Cancellation scopes for collection requests
//!
//! A [`CancelScope`] belongs to one view session. Every request issued for
//! that view runs under the scope (or a child of it), so cancelling the scope,
//! or dropping it when the view goes away, aborts all of the view's in-flight
//! requests without touching any other view.
//!
//! # Example
//!
//! ```rust
//! use nwa_table::cancel::CancelScope;
//!
//! let view_scope = CancelScope::new();
//! let request_scope = view_scope.child();
//!
//! view_scope.cancel();
//! assert!(request_scope.is_cancelled());
//! ```

use std::future::Future;

use tokio_util::sync::CancellationToken;

/// Outcome of running a future under a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// Cancellation scope for one view session or request
///
/// Dropping a scope cancels it and all of its children.
#[derive(Debug, Default)]
pub struct CancelScope {
    token: CancellationToken,
}

impl CancelScope {
    /// Create a root scope
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Derive a child scope
    ///
    /// Cancelling the parent cancels the child; cancelling the child leaves the
    /// parent alone.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    /// Cancel this scope and its children
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the scope has been cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the scope is cancelled
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Run `future` unless the scope is cancelled first
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] when the scope is, or becomes, cancelled before
    /// `future` completes.
    pub async fn run<F>(&self, future: F) -> Result<F::Output, Cancelled>
    where
        F: Future,
    {
        if self.is_cancelled() {
            return Err(Cancelled);
        }
        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(Cancelled),
            output = future => Ok(output),
        }
    }
}

impl Drop for CancelScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
