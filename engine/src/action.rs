//! Action records and their typed, per-store decoding.
//!
//! An [`Action`] is the raw record that travels through the dispatcher:
//! a `kind` string plus an optional bag of data. Each store declares which
//! kinds it reacts to in an [`ActionKinds`] table and decodes matching actions
//! into a typed [`StoreAction`] or [`SingleAction`]. Kinds outside the table
//! decode to `None` and are ignored.

use crate::{entity, entity::Entity, error::Result, EntityId, Error, Filter};
use serde::{Deserialize, Serialize};

/// Payload of an action. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionData {
    /// Target entity or owning scope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// A single entity payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<serde_json::Value>,
    /// A page of entity payloads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<serde_json::Value>>,
    /// Total number of entities on the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    /// Requested page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    /// Requested filter, `None` clears it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
}

/// An action record. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    kind: String,
    #[serde(default)]
    data: ActionData,
}

impl Action {
    /// Create an action with no data.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: ActionData::default(),
        }
    }

    /// Create an action with the given data.
    pub fn with_data(kind: impl Into<String>, data: ActionData) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// Set the id.
    pub fn id(mut self, id: impl Into<EntityId>) -> Self {
        self.data.id = Some(id.into());
        self
    }

    /// Set a single entity payload.
    pub fn entity(mut self, entity: serde_json::Value) -> Self {
        self.data.entity = Some(entity);
        self
    }

    /// Set a page of entity payloads.
    pub fn entities(mut self, entities: Vec<serde_json::Value>) -> Self {
        self.data.entities = Some(entities);
        self
    }

    /// Set the total count.
    pub fn count(mut self, count: i64) -> Self {
        self.data.count = Some(count);
        self
    }

    /// Set the requested page.
    pub fn page(mut self, page: i64) -> Self {
        self.data.page = Some(page);
        self
    }

    /// Set the requested filter.
    pub fn filter(mut self, filter: Option<Filter>) -> Self {
        self.data.filter = filter;
        self
    }

    /// The action kind.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The action data.
    pub fn data(&self) -> &ActionData {
        &self.data
    }

    /// Parse an action record from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidAction(e.to_string()))
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidAction(e.to_string()))
    }
}

/// Store operations an action kind can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionOp {
    Sync,
    Traverse,
    Filter,
    Load,
    Change,
    Remove,
}

/// The kinds a store reacts to, one optional kind string per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionKinds {
    pub sync: Option<&'static str>,
    pub traverse: Option<&'static str>,
    pub filter: Option<&'static str>,
    pub load: Option<&'static str>,
    pub change: Option<&'static str>,
    pub remove: Option<&'static str>,
}

impl ActionKinds {
    /// A table that reacts to nothing.
    pub const fn new() -> Self {
        Self {
            sync: None,
            traverse: None,
            filter: None,
            load: None,
            change: None,
            remove: None,
        }
    }

    pub const fn sync(mut self, kind: &'static str) -> Self {
        self.sync = Some(kind);
        self
    }

    pub const fn traverse(mut self, kind: &'static str) -> Self {
        self.traverse = Some(kind);
        self
    }

    pub const fn filter(mut self, kind: &'static str) -> Self {
        self.filter = Some(kind);
        self
    }

    pub const fn load(mut self, kind: &'static str) -> Self {
        self.load = Some(kind);
        self
    }

    pub const fn change(mut self, kind: &'static str) -> Self {
        self.change = Some(kind);
        self
    }

    pub const fn remove(mut self, kind: &'static str) -> Self {
        self.remove = Some(kind);
        self
    }

    fn entries(&self) -> [(ActionOp, Option<&'static str>); 6] {
        [
            (ActionOp::Sync, self.sync),
            (ActionOp::Traverse, self.traverse),
            (ActionOp::Filter, self.filter),
            (ActionOp::Load, self.load),
            (ActionOp::Change, self.change),
            (ActionOp::Remove, self.remove),
        ]
    }

    /// The operation `kind` maps to, if any.
    pub fn classify(&self, kind: &str) -> Option<ActionOp> {
        self.entries()
            .into_iter()
            .find(|(_, k)| *k == Some(kind))
            .map(|(op, _)| op)
    }

    /// Every kind string in the table.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.entries().into_iter().filter_map(|(_, k)| k).collect()
    }
}

/// Decoded action for a collection store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreAction<E> {
    /// Replace the collection with a fresh page
    Sync {
        scope: Option<EntityId>,
        entities: Vec<E>,
        total_count: i64,
    },
    /// Move to another page
    Traverse { page: i64 },
    /// Replace the filter
    Filter { filter: Option<Filter> },
    /// Switch the owning scope
    Load { scope: Option<EntityId> },
    /// Replace one entity in place
    Change { entity: E },
    /// Drop one entity
    Remove { id: EntityId },
}

impl<E: Entity> StoreAction<E> {
    /// Decode `action` against `kinds`.
    ///
    /// Returns `Ok(None)` for kinds the table does not list and for actions
    /// that lack the one field they cannot do without. Missing numbers are
    /// defaulted; an entity payload that does not decode is an error.
    pub fn decode(kinds: &ActionKinds, action: &Action) -> Result<Option<Self>> {
        let data = action.data();

        let decoded = match kinds.classify(action.kind()) {
            Some(ActionOp::Sync) => {
                let entities: Vec<E> =
                    entity::decode_all(data.entities.as_deref().unwrap_or_default())?;
                let total_count = data.count.unwrap_or(entities.len() as i64);
                Some(StoreAction::Sync {
                    scope: data.id.clone(),
                    entities,
                    total_count,
                })
            }
            Some(ActionOp::Traverse) => Some(StoreAction::Traverse {
                page: data.page.unwrap_or(0),
            }),
            Some(ActionOp::Filter) => Some(StoreAction::Filter {
                filter: data.filter.clone(),
            }),
            Some(ActionOp::Load) => Some(StoreAction::Load {
                scope: data.id.clone(),
            }),
            Some(ActionOp::Change) => match &data.entity {
                Some(value) => Some(StoreAction::Change {
                    entity: entity::decode(value)?,
                }),
                None => None,
            },
            Some(ActionOp::Remove) => data.id.clone().map(|id| StoreAction::Remove { id }),
            None => None,
        };

        Ok(decoded)
    }
}

/// Decoded action for a single-entity store.
#[derive(Debug, Clone, PartialEq)]
pub enum SingleAction<E> {
    /// Replace the entity; `None` clears it
    Sync { entity: Option<E> },
    /// Replace the entity if it is the same one
    Change { entity: E },
}

impl<E: Entity> SingleAction<E> {
    /// Decode `action` against `kinds`. Only sync and change kinds apply.
    pub fn decode(kinds: &ActionKinds, action: &Action) -> Result<Option<Self>> {
        let data = action.data();

        let decoded = match kinds.classify(action.kind()) {
            Some(ActionOp::Sync) => Some(SingleAction::Sync {
                entity: data.entity.as_ref().map(entity::decode::<E>).transpose()?,
            }),
            Some(ActionOp::Change) => match &data.entity {
                Some(value) => Some(SingleAction::Change {
                    entity: entity::decode(value)?,
                }),
                None => None,
            },
            Some(
                ActionOp::Traverse | ActionOp::Filter | ActionOp::Load | ActionOp::Remove,
            ) => None,
            None => None,
        };

        Ok(decoded)
    }
}
