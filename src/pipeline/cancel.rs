use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::Notify;

/// A tree-structured cancellation signal.
///
/// Cancelling a token wakes every task waiting on [`CancelToken::cancelled`]
/// and transitively cancels every token derived from it with
/// [`CancelToken::child`]. Cancelling a child leaves its parent untouched.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
    children: Mutex<Vec<Weak<Inner>>>,
}

impl Inner {
    fn cancel(&self) {
        // The flag is set while holding the child list so a concurrent
        // `child()` either sees the flag or gets registered and cancelled.
        let children = {
            let mut children = self.children.lock().expect("cancel child list poisoned");
            self.cancelled.store(true, Ordering::SeqCst);
            std::mem::take(&mut *children)
        };
        self.notify.notify_waiters();
        for child in children {
            if let Some(child) = child.upgrade() {
                child.cancel();
            }
        }
    }
}

impl CancelToken {
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Completes once the token is cancelled, without spinning.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // register before checking so a cancel between the check and the
            // await is not lost
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// Derives a token that is cancelled when either the parent or the child
    /// itself is cancelled.
    pub fn child(&self) -> CancelToken {
        let child = CancelToken::default();
        let mut children = self.inner.children.lock().expect("cancel child list poisoned");
        if self.inner.cancelled.load(Ordering::SeqCst) {
            drop(children);
            child.cancel();
        } else {
            children.push(Arc::downgrade(&child.inner));
        }
        child
    }
}
