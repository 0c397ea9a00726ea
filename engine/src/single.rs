//! Store for an entity that exists once, such as the current subscription.

use crate::{
    action::{ActionKinds, SingleAction},
    dispatcher::Handler,
    entity::Entity,
    error::Result,
    notifier::{ChangeNotifier, Listener},
    queue::RunQueue,
    Action,
};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// A store holding at most one `E`.
pub struct SingleStore<E: Entity> {
    name: &'static str,
    kinds: ActionKinds,
    entity: RefCell<Option<Rc<E>>>,
    notifier: ChangeNotifier,
}

impl<E: Entity> SingleStore<E> {
    /// Create an empty store.
    pub fn new(name: &'static str, kinds: ActionKinds, queue: Rc<RunQueue>) -> Self {
        Self {
            name,
            kinds,
            entity: RefCell::new(None),
            notifier: ChangeNotifier::new(queue),
        }
    }

    /// Create an empty store wrapped in Rc, ready for [`SingleStore::handler`].
    pub fn new_shared(name: &'static str, kinds: ActionKinds, queue: Rc<RunQueue>) -> Rc<Self> {
        Rc::new(Self::new(name, kinds, queue))
    }

    /// The dispatcher handler for this store.
    pub fn handler(self: &Rc<Self>) -> Handler {
        let store: Weak<Self> = Rc::downgrade(self);
        Rc::new(move |action: &Action| -> Result<()> {
            match store.upgrade() {
                Some(store) => store.handle(action),
                None => Ok(()),
            }
        })
    }

    /// Store name used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The kinds this store reacts to.
    pub fn kinds(&self) -> &ActionKinds {
        &self.kinds
    }

    /// The current entity, if loaded.
    pub fn entity(&self) -> Option<E> {
        self.entity.borrow().as_deref().cloned()
    }

    /// Shared handle to the current entity, if loaded.
    pub fn shared(&self) -> Option<Rc<E>> {
        self.entity.borrow().clone()
    }

    /// Whether an entity is loaded.
    pub fn is_loaded(&self) -> bool {
        self.entity.borrow().is_some()
    }

    /// Call `listener` after each batch of changes.
    pub fn add_change_listener(&self, listener: Listener) {
        self.notifier.subscribe(listener);
    }

    /// Stop calling `listener`. Returns `false` if it was not subscribed.
    pub fn remove_change_listener(&self, listener: &Listener) -> bool {
        self.notifier.unsubscribe(listener)
    }

    /// Detach every listener.
    pub fn clear_listeners(&self) {
        self.notifier.clear();
    }

    /// Number of attached listeners.
    pub fn listener_count(&self) -> usize {
        self.notifier.listener_count()
    }

    fn handle(&self, action: &Action) -> Result<()> {
        let Some(decoded) = SingleAction::<E>::decode(&self.kinds, action)? else {
            return Ok(());
        };

        tracing::debug!(store = self.name, kind = %action.kind(), "handling action");

        let next = match decoded {
            SingleAction::Sync { entity } => entity.map(Rc::new),
            SingleAction::Change { entity } => {
                let same = match self.entity.borrow().as_deref() {
                    Some(current) => current.id() == entity.id(),
                    None => true,
                };
                if !same {
                    tracing::debug!(
                        store = self.name,
                        id = %entity.id(),
                        "change for a different entity"
                    );
                    return Ok(());
                }
                Some(Rc::new(entity))
            }
        };

        *self.entity.borrow_mut() = next;
        self.notifier.notify();
        Ok(())
    }
}

impl<E: Entity> std::fmt::Debug for SingleStore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleStore")
            .field("name", &self.name)
            .field("entity", &self.entity.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dispatcher;
    use serde::Deserialize;
    use serde_json::json;
    use std::cell::Cell;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Plan {
        id: String,
        #[serde(default)]
        status: String,
    }

    impl Entity for Plan {
        fn id(&self) -> &str {
            &self.id
        }
    }

    const KINDS: ActionKinds = ActionKinds::new().sync("plan.sync").change("plan.change");

    fn fixture() -> (Rc<RunQueue>, Dispatcher, Rc<SingleStore<Plan>>) {
        let queue = RunQueue::new_shared();
        let dispatcher = Dispatcher::new();
        let store = SingleStore::new_shared("plan", KINDS, queue.clone());
        dispatcher.register(store.handler());
        (queue, dispatcher, store)
    }

    #[test]
    fn sync_sets_and_clears() {
        let (queue, dispatcher, store) = fixture();
        assert!(!store.is_loaded());

        dispatcher
            .dispatch(&Action::new("plan.sync").entity(json!({"id": "p1", "status": "active"})))
            .unwrap();
        assert_eq!(store.entity().unwrap().status, "active");

        dispatcher.dispatch(&Action::new("plan.sync")).unwrap();
        assert!(!store.is_loaded());
        assert_eq!(queue.run_pending(), 1);
    }

    #[test]
    fn change_only_applies_to_same_entity() {
        let (queue, dispatcher, store) = fixture();
        dispatcher
            .dispatch(&Action::new("plan.sync").entity(json!({"id": "p1", "status": "active"})))
            .unwrap();
        queue.run_pending();

        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        store.add_change_listener(Rc::new(move || h.set(h.get() + 1)));

        dispatcher
            .dispatch(&Action::new("plan.change").entity(json!({"id": "p2", "status": "canceled"})))
            .unwrap();
        assert_eq!(store.entity().unwrap().id, "p1");
        queue.run_pending();
        assert_eq!(hits.get(), 0);

        dispatcher
            .dispatch(&Action::new("plan.change").entity(json!({"id": "p1", "status": "canceled"})))
            .unwrap();
        queue.run_pending();
        assert_eq!(store.entity().unwrap().status, "canceled");
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn shared_handle_outlives_replacement() {
        let (_queue, dispatcher, store) = fixture();
        dispatcher
            .dispatch(&Action::new("plan.sync").entity(json!({"id": "p1", "status": "active"})))
            .unwrap();
        let held = store.shared().unwrap();

        dispatcher
            .dispatch(&Action::new("plan.sync").entity(json!({"id": "p1", "status": "past_due"})))
            .unwrap();
        assert_eq!(held.status, "active");
        assert_eq!(store.entity().unwrap().status, "past_due");
    }

    #[test]
    fn bad_payload_is_handler_failure() {
        let (_queue, dispatcher, store) = fixture();
        let report = dispatcher
            .dispatch(&Action::new("plan.sync").entity(json!({"status": "active"})))
            .unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(!store.is_loaded());
    }
}
