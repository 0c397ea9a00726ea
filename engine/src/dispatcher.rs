//! Dispatcher - the synchronous action bus.
//!
//! Every action is delivered to every registered handler, in registration
//! order, before [`Dispatcher::dispatch`] returns. Delivery is strictly
//! serialized: a handler that dispatches again is refused with
//! [`Error::ReentrantDispatch`] instead of interleaving two actions.

use crate::{
    error::{HandlerFailure, Result},
    queue::panic_message,
    Action, Error,
};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

/// Opaque registration handle returned by [`Dispatcher::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DispatchToken(u64);

impl std::fmt::Display for DispatchToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ID_{}", self.0)
    }
}

/// A registered action handler.
pub type Handler = Rc<dyn Fn(&Action) -> Result<()>>;

/// Outcome of delivering one action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Number of handlers the action was delivered to
    pub delivered: usize,
    /// Handlers that returned an error or panicked
    pub failures: Vec<HandlerFailure>,
}

impl DispatchReport {
    /// Check if every handler completed without error.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The action bus.
#[derive(Default)]
pub struct Dispatcher {
    handlers: RefCell<Vec<(DispatchToken, Handler)>>,
    next_token: Cell<u64>,
    dispatching: Cell<bool>,
}

impl Dispatcher {
    /// Create a dispatcher with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dispatcher wrapped in Rc for sharing with handlers.
    pub fn new_shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    /// Register a handler to be called for every dispatched action.
    ///
    /// Handlers registered while an action is being delivered first see the
    /// next action.
    pub fn register(&self, handler: Handler) -> DispatchToken {
        let token = DispatchToken(self.next_token.get());
        self.next_token.set(token.0 + 1);
        self.handlers.borrow_mut().push((token, handler));

        tracing::debug!(%token, "handler registered");
        token
    }

    /// Remove a handler. Returns `false` if the token was already removed.
    pub fn unregister(&self, token: DispatchToken) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(t, _)| *t != token);
        let removed = handlers.len() != before;

        if removed {
            tracing::debug!(%token, "handler unregistered");
        }
        removed
    }

    /// Deliver `action` to every registered handler.
    ///
    /// Handler errors and panics are isolated: they are collected in the
    /// returned report and delivery continues with the next handler. The only
    /// error returned to the caller is [`Error::ReentrantDispatch`].
    pub fn dispatch(&self, action: &Action) -> Result<DispatchReport> {
        if self.dispatching.get() {
            tracing::warn!(kind = %action.kind(), "rejected re-entrant dispatch");
            return Err(Error::ReentrantDispatch);
        }

        let _guard = DispatchGuard::enter(&self.dispatching);

        // Handlers registered or removed during delivery do not affect this action
        let handlers: Vec<(DispatchToken, Handler)> = self.handlers.borrow().clone();
        tracing::debug!(kind = %action.kind(), handlers = handlers.len(), "dispatching action");

        let mut report = DispatchReport::default();
        for (token, handler) in handlers {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(action)))
                .unwrap_or_else(|cause| Err(Error::HandlerPanicked(panic_message(&*cause))));

            if let Err(error) = outcome {
                tracing::warn!(%token, kind = %action.kind(), %error, "handler failed");
                report.failures.push(HandlerFailure { token, error });
            }
            report.delivered += 1;
        }

        Ok(report)
    }

    /// Whether an action is currently being delivered.
    pub fn is_dispatching(&self) -> bool {
        self.dispatching.get()
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// Check if no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.borrow().is_empty()
    }

    /// Unregister every handler.
    pub fn clear(&self) {
        self.handlers.borrow_mut().clear();
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handlers", &self.len())
            .field("dispatching", &self.is_dispatching())
            .finish()
    }
}

/// Clears the dispatching flag even if delivery unwinds.
struct DispatchGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> DispatchGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self { flag }
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(log: &Rc<RefCell<Vec<String>>>, name: &'static str) -> Handler {
        let log = log.clone();
        Rc::new(move |action: &Action| -> Result<()> {
            log.borrow_mut().push(format!("{}:{}", name, action.kind()));
            Ok(())
        })
    }

    #[test]
    fn delivers_in_registration_order() {
        let dispatcher = Dispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        dispatcher.register(recorder(&log, "a"));
        dispatcher.register(recorder(&log, "b"));
        dispatcher.register(recorder(&log, "c"));

        let report = dispatcher.dispatch(&Action::new("user.sync")).unwrap();
        assert_eq!(report.delivered, 3);
        assert!(report.is_clean());
        assert_eq!(
            *log.borrow(),
            vec!["a:user.sync", "b:user.sync", "c:user.sync"]
        );
    }

    #[test]
    fn same_handler_twice_gets_two_tokens() {
        let dispatcher = Dispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let handler = recorder(&log, "h");

        let t1 = dispatcher.register(handler.clone());
        let t2 = dispatcher.register(handler);
        assert_ne!(t1, t2);

        dispatcher.dispatch(&Action::new("x")).unwrap();
        assert_eq!(log.borrow().len(), 2);

        assert!(dispatcher.unregister(t1));
        dispatcher.dispatch(&Action::new("x")).unwrap();
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn unregister_is_idempotent() {
        let dispatcher = Dispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let token = dispatcher.register(recorder(&log, "h"));

        assert!(dispatcher.unregister(token));
        assert!(!dispatcher.unregister(token));
        assert!(dispatcher.is_empty());

        dispatcher.dispatch(&Action::new("x")).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn failing_handler_is_isolated() {
        let dispatcher = Dispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        dispatcher.register(recorder(&log, "before"));
        let bad = dispatcher.register(Rc::new(|_: &Action| -> Result<()> {
            Err(Error::InvalidPayload("bad entity".into()))
        }));
        dispatcher.register(recorder(&log, "after"));

        let report = dispatcher.dispatch(&Action::new("x")).unwrap();
        assert_eq!(report.delivered, 3);
        assert_eq!(
            report.failures,
            vec![HandlerFailure {
                token: bad,
                error: Error::InvalidPayload("bad entity".into()),
            }]
        );
        assert_eq!(*log.borrow(), vec!["before:x", "after:x"]);
    }

    #[test]
    fn panicking_handler_is_isolated() {
        let dispatcher = Dispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        dispatcher.register(Rc::new(|_: &Action| -> Result<()> { panic!("handler bug") }));
        dispatcher.register(recorder(&log, "after"));

        let report = dispatcher.dispatch(&Action::new("x")).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(
            report.failures[0].error,
            Error::HandlerPanicked("handler bug".into())
        );
        assert_eq!(*log.borrow(), vec!["after:x"]);
        assert!(!dispatcher.is_dispatching());
    }

    #[test]
    fn reentrant_dispatch_is_rejected() {
        let dispatcher = Dispatcher::new_shared();
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner_result = Rc::new(RefCell::new(None));

        let d = dispatcher.clone();
        let r = inner_result.clone();
        dispatcher.register(Rc::new(move |_: &Action| -> Result<()> {
            *r.borrow_mut() = Some(d.dispatch(&Action::new("inner")));
            Ok(())
        }));
        dispatcher.register(recorder(&log, "other"));

        let report = dispatcher.dispatch(&Action::new("outer")).unwrap();
        assert!(report.is_clean());
        assert_eq!(
            *inner_result.borrow(),
            Some(Err(Error::ReentrantDispatch))
        );
        // Outer action still reached the other handler, inner never did
        assert_eq!(*log.borrow(), vec!["other:outer"]);
        assert!(!dispatcher.is_dispatching());
    }

    #[test]
    fn register_during_dispatch_applies_to_next_action() {
        let dispatcher = Dispatcher::new_shared();
        let log = Rc::new(RefCell::new(Vec::new()));

        let d = dispatcher.clone();
        let l = log.clone();
        let registered = Rc::new(Cell::new(false));
        let flag = registered.clone();
        dispatcher.register(Rc::new(move |_: &Action| -> Result<()> {
            if !flag.replace(true) {
                d.register(recorder(&l, "late"));
            }
            Ok(())
        }));

        dispatcher.dispatch(&Action::new("first")).unwrap();
        assert!(log.borrow().is_empty());

        dispatcher.dispatch(&Action::new("second")).unwrap();
        assert_eq!(*log.borrow(), vec!["late:second"]);
    }

    #[test]
    fn token_display() {
        let dispatcher = Dispatcher::new();
        let token = dispatcher.register(Rc::new(|_: &Action| -> Result<()> { Ok(()) }));
        assert_eq!(token.to_string(), "ID_0");
    }
}
