//! Single-threaded run queue for deferred work.
//!
//! Change notifications are not delivered while an action is being handled.
//! They are enqueued here and run when the host drains the queue between
//! discrete units of external work (an input event, a fetched response).

use std::cell::RefCell;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce()>;

/// FIFO queue of deferred tasks.
#[derive(Default)]
pub struct RunQueue {
    tasks: RefCell<VecDeque<Task>>,
}

impl RunQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            tasks: RefCell::new(VecDeque::new()),
        }
    }

    /// Create an empty queue wrapped in Rc for sharing.
    pub fn new_shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    /// Schedule a task to run on the next drain.
    pub fn enqueue(&self, task: impl FnOnce() + 'static) {
        self.tasks.borrow_mut().push_back(Box::new(task));
    }

    /// Run tasks until the queue is empty.
    ///
    /// Tasks enqueued while draining run in the same drain, after the ones
    /// already queued. A panicking task is logged and skipped. Returns the
    /// number of tasks run.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;

        loop {
            // Borrow ends before the task runs so tasks may enqueue more work
            let next = self.tasks.borrow_mut().pop_front();
            let Some(task) = next else {
                break;
            };

            if let Err(cause) = panic::catch_unwind(AssertUnwindSafe(task)) {
                tracing::warn!(cause = %panic_message(&*cause), "deferred task panicked");
            }
            ran += 1;
        }

        ran
    }

    /// Number of tasks waiting to run.
    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Check if no tasks are waiting.
    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Drop every waiting task without running it. Values captured by the
    /// tasks are released.
    pub fn clear(&self) {
        self.tasks.borrow_mut().clear();
    }
}

impl std::fmt::Debug for RunQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunQueue")
            .field("pending", &self.len())
            .finish()
    }
}

/// Extract a readable message from a panic payload.
pub(crate) fn panic_message(cause: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = cause.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = cause.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
