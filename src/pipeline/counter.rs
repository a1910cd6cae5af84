use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

/// Shared count of tokens currently alive inside the pipeline.
///
/// Every step mutates the count through clones of this handle. All mutations
/// and [`TokenCounter::wait_until_zero`] serialize on the same mutex, and every
/// decrement broadcasts, so the count reaching zero is observed without
/// spinning and without lost wakeups.
#[derive(Clone)]
pub struct TokenCounter {
    inner: Arc<Inner>,
}

struct Inner {
    count: Mutex<u64>,
    drained: Notify,
    enabled: bool,
}

impl TokenCounter {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                count: Mutex::new(0),
                drained: Notify::new(),
                enabled,
            }),
        }
    }

    pub fn increment(&self) {
        if !self.inner.enabled {
            return;
        }
        let mut count = self.inner.count.lock().expect("token count lock poisoned");
        *count += 1;
    }

    pub fn decrement(&self) {
        if !self.inner.enabled {
            return;
        }
        {
            let mut count = self.inner.count.lock().expect("token count lock poisoned");
            debug_assert!(*count > 0, "token count underflow");
            *count = count.saturating_sub(1);
        }
        self.inner.drained.notify_waiters();
    }

    pub fn snapshot(&self) -> u64 {
        if !self.inner.enabled {
            return 0;
        }
        *self.inner.count.lock().expect("token count lock poisoned")
    }

    /// Completes once the count reaches zero.
    ///
    /// # Panics
    ///
    /// Panics when token tracking was disabled via the pipeline config's
    /// `track_tokens_count` flag: with no-op hooks there is nothing to wait on.
    pub async fn wait_until_zero(&self) {
        assert!(
            self.inner.enabled,
            "wait_until_zero requires track_tokens_count"
        );
        loop {
            let drained = self.inner.drained.notified();
            tokio::pin!(drained);
            drained.as_mut().enable();
            if self.snapshot() == 0 {
                return;
            }
            drained.await;
        }
    }
}
