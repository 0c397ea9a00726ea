//! Store - the per-entity state container.
//!
//! A [`Store`] owns one collection of entities together with its view state.
//! It is only ever changed by its own dispatcher handler: every action is
//! decoded against the store's [`ActionKinds`], the next state is computed in
//! full from the current one, and then published in a single assignment before
//! a change notification is scheduled. Readers never see a half-built state.

use crate::{
    action::{ActionKinds, StoreAction},
    dispatcher::Handler,
    entity::Entity,
    error::Result,
    notifier::{ChangeNotifier, Listener},
    queue::RunQueue,
    snapshot::{Collection, Snapshot},
    view::ViewState,
    Action, EntityId, Filter,
};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// One published state of a store.
#[derive(Debug)]
pub struct StoreState<E> {
    collection: Collection<E>,
    view: ViewState,
    scope: Option<EntityId>,
}

impl<E> Clone for StoreState<E> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            view: self.view.clone(),
            scope: self.scope.clone(),
        }
    }
}

impl<E> StoreState<E> {
    fn empty(page_size: usize) -> Self {
        Self {
            collection: Collection::default(),
            view: ViewState::new(page_size),
            scope: None,
        }
    }

    /// The collection.
    pub fn collection(&self) -> &Collection<E> {
        &self.collection
    }

    /// The view state.
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// The owning scope, for scoped collections.
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }
}

/// A store holding a paginated collection of `E`.
pub struct Store<E: Entity> {
    name: &'static str,
    kinds: ActionKinds,
    state: RefCell<Rc<StoreState<E>>>,
    notifier: ChangeNotifier,
}

impl<E: Entity> Store<E> {
    /// Create an empty store.
    ///
    /// `name` labels log output, `kinds` lists the actions the store reacts
    /// to, and `queue` is where change notifications are scheduled.
    pub fn new(
        name: &'static str,
        kinds: ActionKinds,
        page_size: usize,
        queue: Rc<RunQueue>,
    ) -> Self {
        Self {
            name,
            kinds,
            state: RefCell::new(Rc::new(StoreState::empty(page_size))),
            notifier: ChangeNotifier::new(queue),
        }
    }

    /// Create an empty store wrapped in Rc, ready for [`Store::handler`].
    pub fn new_shared(
        name: &'static str,
        kinds: ActionKinds,
        page_size: usize,
        queue: Rc<RunQueue>,
    ) -> Rc<Self> {
        Rc::new(Self::new(name, kinds, page_size, queue))
    }

    /// The dispatcher handler for this store.
    ///
    /// The handler holds a weak reference, so registering it does not keep
    /// the store alive.
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

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    /// The current published state.
    pub fn state(&self) -> Rc<StoreState<E>> {
        Rc::clone(&self.state.borrow())
    }

    /// Read-only view of the current entities.
    pub fn snapshot(&self) -> Snapshot<E> {
        self.state.borrow().collection.snapshot().clone()
    }

    /// Entity with the given id.
    pub fn entity(&self, id: &str) -> Option<E> {
        self.state.borrow().collection.get(id).cloned()
    }

    /// Position of `id` in the current snapshot.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.state.borrow().collection.position(id)
    }

    /// Current page, 0-based.
    pub fn page(&self) -> usize {
        self.state.borrow().view.page
    }

    /// Number of pages for the current total count.
    pub fn page_count(&self) -> usize {
        self.state.borrow().view.page_count()
    }

    /// Entities per page.
    pub fn page_size(&self) -> usize {
        self.state.borrow().view.page_size
    }

    /// Active filter, if any.
    pub fn filter(&self) -> Option<Filter> {
        self.state.borrow().view.filter.clone()
    }

    /// Total number of entities on the server.
    pub fn total_count(&self) -> usize {
        self.state.borrow().view.total_count
    }

    /// Full view state.
    pub fn view(&self) -> ViewState {
        self.state.borrow().view.clone()
    }

    /// Owning scope of the current collection.
    pub fn scope(&self) -> Option<EntityId> {
        self.state.borrow().scope.clone()
    }

    /// Number of entities in the current snapshot.
    pub fn len(&self) -> usize {
        self.state.borrow().collection.len()
    }

    /// Check if the current snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.state.borrow().collection.is_empty()
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

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

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    fn handle(&self, action: &Action) -> Result<()> {
        let Some(decoded) = StoreAction::<E>::decode(&self.kinds, action)? else {
            return Ok(());
        };

        tracing::debug!(store = self.name, kind = %action.kind(), "handling action");
        self.apply(decoded);
        Ok(())
    }

    /// Apply one decoded action. Returns whether new state was published.
    fn apply(&self, action: StoreAction<E>) -> bool {
        let current = self.state();

        let next = match action {
            StoreAction::Sync {
                scope,
                entities,
                total_count,
            } => {
                if let (Some(current_scope), Some(scope)) = (&current.scope, &scope) {
                    if current_scope != scope {
                        tracing::debug!(
                            store = self.name,
                            current = %current_scope,
                            stale = %scope,
                            "ignoring sync for another scope"
                        );
                        return false;
                    }
                }

                let built = Collection::build(entities);
                if !built.duplicates.is_empty() {
                    tracing::warn!(
                        store = self.name,
                        duplicates = ?built.duplicates,
                        "sync contains duplicate ids, index resolves to last occurrence"
                    );
                }

                StoreState {
                    collection: built.collection,
                    view: current.view.with_total_count(total_count),
                    // An unscoped store adopts the scope of the first scoped sync
                    scope: current.scope.clone().or(scope),
                }
            }

            StoreAction::Traverse { page } => StoreState {
                view: current.view.with_page(page),
                ..(*current).clone()
            },

            StoreAction::Filter { filter } => StoreState {
                view: current.view.with_filter(filter),
                ..(*current).clone()
            },

            StoreAction::Load { scope } => {
                if scope == current.scope {
                    return false;
                }

                StoreState {
                    collection: Collection::default(),
                    view: current.view.reset(),
                    scope,
                }
            }

            StoreAction::Change { entity } => {
                let id = entity.id().to_string();
                match current.collection.with_replaced(entity) {
                    Some(collection) => StoreState {
                        collection,
                        ..(*current).clone()
                    },
                    None => {
                        tracing::debug!(store = self.name, %id, "change for unknown entity");
                        return false;
                    }
                }
            }

            StoreAction::Remove { id } => match current.collection.without(&id) {
                Some(collection) => {
                    // Duplicated ids drop every record carrying them
                    let removed = current.collection.len() - collection.len();
                    let remaining = current.view.total_count.saturating_sub(removed);
                    StoreState {
                        collection,
                        view: current
                            .view
                            .with_total_count(i64::try_from(remaining).unwrap_or(i64::MAX)),
                        scope: current.scope.clone(),
                    }
                }
                None => {
                    tracing::debug!(store = self.name, %id, "remove for unknown entity");
                    return false;
                }
            },
        };

        self.publish(next);
        true
    }

    fn publish(&self, next: StoreState<E>) {
        *self.state.borrow_mut() = Rc::new(next);
        self.notifier.notify();
    }
}

impl<E: Entity> std::fmt::Debug for Store<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("Store")
            .field("name", &self.name)
            .field("len", &state.collection.len())
            .field("view", &state.view)
            .field("scope", &state.scope)
            .finish()
    }
}
