//! Deferred, coalescing change notification.
//!
//! A store calls [`ChangeNotifier::notify`] every time it publishes new state.
//! Delivery is not immediate: the first `notify()` schedules one batch on the
//! [`RunQueue`], and every further `notify()` before that batch runs folds into
//! it. Each subscriber therefore sees a single callback per batch, however many
//! transitions the store went through while handling an action.

use crate::queue::{panic_message, RunQueue};
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

/// A change callback. Identity is the `Rc` allocation, so keep the same
/// `Rc` around to unsubscribe.
pub type Listener = Rc<dyn Fn()>;

#[derive(Default)]
struct Inner {
    listeners: RefCell<Vec<Listener>>,
    // Alive exactly while the queued batch task is alive
    batch: RefCell<Weak<()>>,
}

impl Inner {
    fn is_pending(&self) -> bool {
        self.batch.borrow().strong_count() > 0
    }

    fn deliver(&self) {
        // Copy the list so listeners can (un)subscribe during delivery
        let batch: Vec<Listener> = self.listeners.borrow().clone();
        tracing::trace!(listeners = batch.len(), "delivering change batch");

        for listener in batch {
            if let Err(cause) = panic::catch_unwind(AssertUnwindSafe(|| listener())) {
                tracing::warn!(cause = %panic_message(&*cause), "change listener panicked");
            }
        }
    }
}

/// Per-store publish/subscribe with deferred delivery.
pub struct ChangeNotifier {
    inner: Rc<Inner>,
    queue: Rc<RunQueue>,
}

impl ChangeNotifier {
    /// Create a notifier that schedules its batches on `queue`.
    pub fn new(queue: Rc<RunQueue>) -> Self {
        Self {
            inner: Rc::new(Inner::default()),
            queue,
        }
    }

    /// Add a listener. Subscribing the same `Rc` twice makes it fire twice.
    pub fn subscribe(&self, listener: Listener) {
        self.inner.listeners.borrow_mut().push(listener);
    }

    /// Remove one subscription of `listener`.
    ///
    /// Returns `false` if it was not subscribed. A batch already being
    /// delivered still reaches it.
    pub fn unsubscribe(&self, listener: &Listener) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        match listeners.iter().position(|l| Rc::ptr_eq(l, listener)) {
            Some(pos) => {
                listeners.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Schedule delivery to all listeners, coalescing with a pending batch.
    ///
    /// A batch dropped from the queue without running no longer counts as
    /// pending, so the next `notify()` schedules a fresh one.
    pub fn notify(&self) {
        if self.inner.is_pending() {
            return;
        }

        let marker = Rc::new(());
        *self.inner.batch.borrow_mut() = Rc::downgrade(&marker);

        let weak: Weak<Inner> = Rc::downgrade(&self.inner);
        self.queue.enqueue(move || {
            // Released before delivery so listeners can schedule the next batch
            drop(marker);
            if let Some(inner) = weak.upgrade() {
                inner.deliver();
            }
        });
    }

    /// Whether a batch is scheduled but not yet delivered.
    pub fn is_pending(&self) -> bool {
        self.inner.is_pending()
    }

    /// Number of active subscriptions.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Detach every listener.
    pub fn clear(&self) {
        self.inner.listeners.borrow_mut().clear();
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listener_count())
            .field("pending", &self.is_pending())
            .finish()
    }
}
