//! Per-call cancellation signal.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// One-shot cancellation flag shared between an in-flight request and the
/// orchestrator that may abort it.
///
/// The orchestrator allocates one signal per call and sets it only when the
/// call's timeout expires. Clones share the same flag, so a transport holding
/// a clone observes the cancellation promptly via [`cancelled`].
///
/// [`cancelled`]: CancelSignal::cancelled
#[derive(Clone, Default)]
pub struct CancelSignal {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelSignal {
    /// Create a new, unset signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signal, waking every pending [`cancelled`] waiter.
    ///
    /// Setting an already-set signal is a no-op.
    ///
    /// [`cancelled`]: CancelSignal::cancelled
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    /// Check whether the signal has been set.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once the signal is set.
    ///
    /// Returns immediately if it already is.
    pub async fn cancelled(&self) {
        // Register the waiter before re-checking the flag so a concurrent
        // cancel() cannot slip between the check and the await.
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

impl fmt::Debug for CancelSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelSignal")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
