//! Debounced delivery of rapidly changing values
//!
//! Free-text filter inputs change on every keystroke. A [`Debouncer`] holds
//! back each value until the input has been quiet for a while and then hands
//! over only the latest one, so a burst of edits turns into a single request.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Default quiet period
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Coalesces pushed values, emitting the latest once input settles
///
/// The emitting task runs on the current Tokio runtime and stops when the
/// debouncer is dropped; a value still waiting at that point is discarded.
#[derive(Debug)]
pub struct Debouncer<T> {
    sender: mpsc::UnboundedSender<T>,
    task: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
    T: Send + 'static,
{
    /// Spawn a debouncer calling `emit` after `quiet` without new values
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<F>(quiet: Duration, mut emit: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        let (sender, mut receiver) = mpsc::unbounded_channel::<T>();

        let task = tokio::spawn(async move {
            while let Some(mut latest) = receiver.recv().await {
                loop {
                    tokio::select! {
                        next = receiver.recv() => match next {
                            Some(value) => latest = value,
                            None => return,
                        },
                        () = tokio::time::sleep(quiet) => break,
                    }
                }
                emit(latest);
            }
        });

        Self { sender, task }
    }

    /// Submit a value, restarting the quiet period
    pub fn push(&self, value: T) {
        if self.sender.send(value).is_err() {
            tracing::debug!("Debouncer task has stopped, value dropped");
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
