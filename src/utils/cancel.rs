//! Cancellation utilities
//!
//! Provides the cancellation handle handed to a stream consumer at
//! construction time.

use tokio_util::sync::CancellationToken;

/// A handle that can be used to request cancellation.
///
/// Clones share one token: the caller keeps a clone to cancel, the read loop
/// owns the other and observes it.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Create a new, not yet cancelled handle.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Request cancellation. A read loop observing this handle stops at its
    /// next suspension point and drops the response body, which closes the
    /// underlying HTTP connection.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A future that resolves when cancellation is requested.
    pub fn cancelled(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_wakes_waiter() {
        let handle = CancelHandle::new();
        let waiter = handle.clone();
        let task = tokio::spawn(async move { waiter.cancelled().await });

        tokio::task::yield_now().await;
        assert!(!handle.is_cancelled());
        handle.cancel();

        tokio::time::timeout(std::time::Duration::from_millis(200), task)
            .await
            .expect("cancel should wake the waiting task")
            .expect("task ok");
        assert!(handle.is_cancelled());
    }
}
