//! Registry - owner of the action bus and every domain store.
//!
//! A [`Registry`] is built once at startup: it creates the run queue, the
//! dispatcher and one store per entity kind, and registers each store's
//! handler in a fixed order (users, certificates, devices, subscription).
//! [`Registry::shutdown`] undoes all of it so tests and embedders can tear
//! down cleanly.
//!
//! Hosts that want a single process-wide instance can use [`install`],
//! [`with`] and [`teardown`], which keep one registry per thread.

use crate::{
    config::{ConfigError, EngineConfig},
    dispatcher::{DispatchReport, DispatchToken, Dispatcher},
    domain::{certificate, device, subscription, user, Certificate, Device, Subscription, User},
    error::Result,
    queue::RunQueue,
    single::SingleStore,
    store::Store,
    Action,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// All stores of the control panel plus the bus that feeds them.
pub struct Registry {
    config: EngineConfig,
    queue: Rc<RunQueue>,
    dispatcher: Rc<Dispatcher>,
    users: Rc<Store<User>>,
    certificates: Rc<Store<Certificate>>,
    devices: Rc<Store<Device>>,
    subscription: Rc<SingleStore<Subscription>>,
    tokens: RefCell<Vec<DispatchToken>>,
    shut_down: Cell<bool>,
}

impl Registry {
    /// Build every store and register it on a fresh dispatcher.
    pub fn new(config: EngineConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        let queue = RunQueue::new_shared();
        let dispatcher = Dispatcher::new_shared();

        let users = Store::new_shared("users", user::KINDS, config.page_size, queue.clone());
        let certificates = Store::new_shared(
            "certificates",
            certificate::KINDS,
            config.page_size,
            queue.clone(),
        );
        let devices = Store::new_shared("devices", device::KINDS, config.page_size, queue.clone());
        let subscription =
            SingleStore::new_shared("subscription", subscription::KINDS, queue.clone());

        let tokens = vec![
            dispatcher.register(users.handler()),
            dispatcher.register(certificates.handler()),
            dispatcher.register(devices.handler()),
            dispatcher.register(subscription.handler()),
        ];

        tracing::info!(page_size = config.page_size, "registry initialized");

        Ok(Self {
            config,
            queue,
            dispatcher,
            users,
            certificates,
            devices,
            subscription,
            tokens: RefCell::new(tokens),
            shut_down: Cell::new(false),
        })
    }

    /// Deliver `action` to every store.
    ///
    /// Change notifications are queued, not delivered; call
    /// [`Registry::flush`] once the current unit of work is done.
    pub fn dispatch(&self, action: &Action) -> Result<DispatchReport> {
        self.dispatcher.dispatch(action)
    }

    /// Deliver pending change notifications. Returns the batches delivered.
    pub fn flush(&self) -> usize {
        self.queue.run_pending()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Rc<Dispatcher> {
        &self.dispatcher
    }

    pub fn queue(&self) -> &Rc<RunQueue> {
        &self.queue
    }

    pub fn users(&self) -> &Rc<Store<User>> {
        &self.users
    }

    pub fn certificates(&self) -> &Rc<Store<Certificate>> {
        &self.certificates
    }

    pub fn devices(&self) -> &Rc<Store<Device>> {
        &self.devices
    }

    pub fn subscription(&self) -> &Rc<SingleStore<Subscription>> {
        &self.subscription
    }

    /// Unregister every store, detach every listener and drop queued
    /// notifications. Store contents stay readable. Calling it twice is a
    /// no-op.
    pub fn shutdown(&self) {
        if self.shut_down.replace(true) {
            return;
        }

        for token in self.tokens.borrow_mut().drain(..) {
            self.dispatcher.unregister(token);
        }

        self.users.clear_listeners();
        self.certificates.clear_listeners();
        self.devices.clear_listeners();
        self.subscription.clear_listeners();
        self.queue.clear();

        tracing::info!("registry shut down");
    }

    /// Whether [`Registry::shutdown`] has run.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.get()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .field("queue", &self.queue)
            .field("shut_down", &self.shut_down.get())
            .finish()
    }
}

thread_local! {
    static CURRENT: RefCell<Option<Rc<Registry>>> = const { RefCell::new(None) };
}

/// Build a registry and make it this thread's current one.
///
/// A previously installed registry is shut down first.
pub fn install(config: EngineConfig) -> std::result::Result<Rc<Registry>, ConfigError> {
    let registry = Rc::new(Registry::new(config)?);
    let previous = CURRENT.with(|current| current.borrow_mut().replace(registry.clone()));

    if let Some(previous) = previous {
        previous.shutdown();
    }
    Ok(registry)
}

/// The installed registry, if any.
pub fn current() -> Option<Rc<Registry>> {
    CURRENT.with(|current| current.borrow().clone())
}

/// Run `f` against the installed registry.
pub fn with<R>(f: impl FnOnce(&Registry) -> R) -> Option<R> {
    current().map(|registry| f(&registry))
}

/// Shut down and remove the installed registry. Returns `false` if none was
/// installed.
pub fn teardown() -> bool {
    let previous = CURRENT.with(|current| current.borrow_mut().take());
    match previous {
        Some(registry) => {
            registry.shutdown();
            true
        }
        None => false,
    }
}
