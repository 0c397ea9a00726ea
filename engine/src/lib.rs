//! # PanelSync Engine
//!
//! Action dispatch and store synchronization for a control-panel client.
//!
//! Views never mutate data directly. Every change is described as an
//! [`Action`], broadcast through a single [`Dispatcher`] to every registered
//! store, and each store decides on its own whether the action concerns it.
//! Stores publish immutable state and tell their listeners that something
//! changed; listeners then re-read whatever they need.
//!
//! ## Design Principles
//!
//! - **No IO**: fetching data is the host's job, the engine only receives it
//! - **Single-threaded**: stores are `Rc`/`RefCell` based and never shared
//!   across threads
//! - **Immutable snapshots**: readers always see a complete, consistent state
//! - **Coalesced notifications**: one burst of changes produces one
//!   notification per store, delivered from the [`RunQueue`]
//!
//! ## Core Concepts
//!
//! ### Actions
//!
//! An [`Action`] is a kind string plus an [`ActionData`] payload. Each store
//! owns an [`ActionKinds`] table mapping kind strings to the operation it
//! performs:
//! - sync - replace the collection with a fetched page
//! - traverse - move to another page
//! - filter - replace the active filter
//! - load - switch the owning scope (devices of one user)
//! - change / remove - patch a single entity
//!
//! ### Dispatcher
//!
//! The [`Dispatcher`] delivers each action to every handler in registration
//! order. A handler that dispatches while a dispatch is running gets
//! [`Error::ReentrantDispatch`]. Handler errors and panics are collected in
//! the [`DispatchReport`] and never stop delivery to the other handlers.
//!
//! ### Stores
//!
//! A [`Store`] holds a [`Collection`] (an immutable [`Snapshot`] plus its id
//! [`Index`]) and a [`ViewState`] with pagination and the active [`Filter`].
//! A [`SingleStore`] holds at most one entity.
//!
//! ### Change notification
//!
//! Each store owns a [`ChangeNotifier`]. Any number of `notify()` calls before
//! the [`RunQueue`] is drained result in a single call to every listener.
//!
//! ## Quick Start
//!
//! ```rust
//! use panelsync_engine::{domain::user, Action, EngineConfig, Registry};
//! use serde_json::json;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! // 1. Build the registry
//! let registry = Registry::new(EngineConfig::default()).unwrap();
//!
//! // 2. Listen for changes
//! let changed = Rc::new(Cell::new(0));
//! let counter = changed.clone();
//! registry
//!     .users()
//!     .add_change_listener(Rc::new(move || counter.set(counter.get() + 1)));
//!
//! // 3. Dispatch a fetched page
//! let action = Action::new(user::SYNC)
//!     .entities(vec![json!({"id": "u1", "username": "alice"})])
//!     .count(120);
//! let report = registry.dispatch(&action).unwrap();
//! assert!(report.is_clean());
//!
//! // 4. Deliver notifications and read the new state
//! registry.flush();
//! assert_eq!(changed.get(), 1);
//! assert_eq!(registry.users().entity("u1").unwrap().username, "alice");
//! assert_eq!(registry.users().page_count(), 3);
//! ```

pub mod action;
pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod entity;
pub mod error;
pub mod filter;
pub mod notifier;
pub mod queue;
pub mod registry;
pub mod single;
pub mod snapshot;
pub mod store;
pub mod view;

// Re-export main types at crate root
pub use action::{Action, ActionData, ActionKinds, ActionOp, SingleAction, StoreAction};
pub use config::{ConfigError, EngineConfig};
pub use dispatcher::{DispatchReport, DispatchToken, Dispatcher, Handler};
pub use entity::Entity;
pub use error::{Error, HandlerFailure, Result};
pub use filter::Filter;
pub use notifier::{ChangeNotifier, Listener};
pub use queue::{RunQueue, Task};
pub use registry::Registry;
pub use single::SingleStore;
pub use snapshot::{Built, Collection, Index, Snapshot};
pub use store::{Store, StoreState};
pub use view::{ViewState, DEFAULT_PAGE_SIZE};

/// Type aliases for clarity
pub type EntityId = String;
