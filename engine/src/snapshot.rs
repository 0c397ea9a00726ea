//! Snapshot and index types.
//!
//! A [`Collection`] pairs a read-only [`Snapshot`] with the [`Index`] that
//! describes it. Both are built together from owned buffers and never change
//! afterwards; the store publishes a new collection instead of editing one, so
//! an index can never be stale relative to the snapshot it travels with.

use crate::{entity::Entity, EntityId};
use serde::Serialize;
use std::collections::HashMap;
use std::ops::Deref;
use std::rc::Rc;

/// Read-only, cheaply clonable view of an ordered entity sequence.
///
/// Derefs to `[E]`, so it can be iterated and indexed, but never mutated.
/// Use [`Snapshot::to_vec`] for an owned, editable copy.
#[derive(Debug)]
pub struct Snapshot<E> {
    entities: Rc<[E]>,
}

impl<E> Clone for Snapshot<E> {
    fn clone(&self) -> Self {
        Self {
            entities: Rc::clone(&self.entities),
        }
    }
}

impl<E> Default for Snapshot<E> {
    fn default() -> Self {
        Self {
            entities: Rc::from(Vec::new()),
        }
    }
}

impl<E> Snapshot<E> {
    fn from_vec(entities: Vec<E>) -> Self {
        Self {
            entities: Rc::from(entities),
        }
    }

    /// Check if two snapshots are the same published value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.entities, &other.entities)
    }
}

impl<E: Clone> Snapshot<E> {
    /// Owned copy of the entities that the caller may modify freely.
    pub fn to_vec(&self) -> Vec<E> {
        self.entities.to_vec()
    }
}

impl<E> Deref for Snapshot<E> {
    type Target = [E];

    fn deref(&self) -> &[E] {
        &self.entities
    }
}

impl<E> AsRef<[E]> for Snapshot<E> {
    fn as_ref(&self) -> &[E] {
        &self.entities
    }
}

impl<'a, E> IntoIterator for &'a Snapshot<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

impl<E: PartialEq> PartialEq for Snapshot<E> {
    fn eq(&self, other: &Self) -> bool {
        self.entities[..] == other.entities[..]
    }
}

impl<E: Serialize> Serialize for Snapshot<E> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entities[..].serialize(serializer)
    }
}

/// Id to position mapping for one snapshot.
pub type Index = HashMap<EntityId, usize>;

/// A snapshot and its index, always replaced as a unit.
#[derive(Debug)]
pub struct Collection<E> {
    snapshot: Snapshot<E>,
    index: Rc<Index>,
}

impl<E> Clone for Collection<E> {
    fn clone(&self) -> Self {
        Self {
            snapshot: self.snapshot.clone(),
            index: Rc::clone(&self.index),
        }
    }
}

impl<E> Default for Collection<E> {
    fn default() -> Self {
        Self {
            snapshot: Snapshot::default(),
            index: Rc::new(Index::new()),
        }
    }
}

/// Result of building a collection.
#[derive(Debug)]
pub struct Built<E> {
    /// The new collection
    pub collection: Collection<E>,
    /// Ids that appeared more than once in the input
    pub duplicates: Vec<EntityId>,
}

impl<E: Entity> Collection<E> {
    /// Build a collection from entities in the given order.
    ///
    /// Duplicate ids are not removed: the snapshot keeps every record while the
    /// index points at the last occurrence. The duplicated ids are returned so
    /// the caller can report them.
    pub fn build(entities: Vec<E>) -> Built<E> {
        let mut index = Index::with_capacity(entities.len());
        let mut duplicates = Vec::new();

        for (pos, entity) in entities.iter().enumerate() {
            if index.insert(entity.id().to_string(), pos).is_some() {
                duplicates.push(entity.id().to_string());
            }
        }

        Built {
            collection: Self {
                snapshot: Snapshot::from_vec(entities),
                index: Rc::new(index),
            },
            duplicates,
        }
    }

    /// Collection with the indexed record for `entity.id()` replaced.
    ///
    /// Positions do not move, so the index is shared with `self`. Returns
    /// `None` when the id is unknown.
    pub fn with_replaced(&self, entity: E) -> Option<Self> {
        let pos = *self.index.get(entity.id())?;
        let mut entities = self.snapshot.to_vec();
        entities[pos] = entity;

        Some(Self {
            snapshot: Snapshot::from_vec(entities),
            index: Rc::clone(&self.index),
        })
    }

    /// Collection without any record carrying `id`, reindexed.
    ///
    /// Returns `None` when the id is unknown.
    pub fn without(&self, id: &str) -> Option<Self> {
        if !self.index.contains_key(id) {
            return None;
        }

        let remaining: Vec<E> = self
            .snapshot
            .iter()
            .filter(|e| e.id() != id)
            .cloned()
            .collect();

        Some(Self::build(remaining).collection)
    }
}

impl<E> Collection<E> {
    /// The snapshot.
    pub fn snapshot(&self) -> &Snapshot<E> {
        &self.snapshot
    }

    /// Position of `id` in the snapshot.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Entity with the given id.
    pub fn get(&self, id: &str) -> Option<&E> {
        self.position(id).and_then(|pos| self.snapshot.get(pos))
    }

    /// Number of records in the snapshot.
    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    /// Check if the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
    struct Item {
        id: String,
        #[serde(default)]
        label: String,
    }

    impl Entity for Item {
        fn id(&self) -> &str {
            &self.id
        }
    }

    fn item(id: &str, label: &str) -> Item {
        Item {
            id: id.into(),
            label: label.into(),
        }
    }

    #[test]
    fn build_indexes_positions() {
        let built = Collection::build(vec![item("a", ""), item("b", ""), item("c", "")]);
        assert!(built.duplicates.is_empty());

        let collection = built.collection;
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.position("a"), Some(0));
        assert_eq!(collection.position("c"), Some(2));
        assert_eq!(collection.get("b"), Some(&item("b", "")));
        assert_eq!(collection.get("z"), None);
    }

    #[test]
    fn duplicate_ids_index_last_occurrence() {
        let built = Collection::build(vec![item("a", "first"), item("b", ""), item("a", "second")]);
        assert_eq!(built.duplicates, vec!["a".to_string()]);

        let collection = built.collection;
        // Every record kept, lookup resolves to the last one
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.position("a"), Some(2));
        assert_eq!(collection.get("a").unwrap().label, "second");
    }

    #[test]
    fn replace_keeps_positions() {
        let collection = Collection::build(vec![item("a", "old"), item("b", "")]).collection;
        let next = collection.with_replaced(item("a", "new")).unwrap();

        assert_eq!(next.get("a").unwrap().label, "new");
        assert_eq!(next.position("b"), Some(1));
        // Previous snapshot untouched
        assert_eq!(collection.get("a").unwrap().label, "old");
        assert!(!next.snapshot().ptr_eq(collection.snapshot()));

        assert!(collection.with_replaced(item("z", "")).is_none());
    }

    #[test]
    fn without_reindexes() {
        let collection =
            Collection::build(vec![item("a", ""), item("b", ""), item("c", "")]).collection;
        let next = collection.without("a").unwrap();

        assert_eq!(next.len(), 2);
        assert_eq!(next.position("b"), Some(0));
        assert_eq!(next.position("c"), Some(1));
        assert_eq!(next.position("a"), None);

        assert!(collection.without("z").is_none());
    }

    #[test]
    fn snapshot_is_shared_and_copyable() {
        let collection = Collection::build(vec![item("a", ""), item("b", "")]).collection;
        let s1 = collection.snapshot().clone();
        let s2 = collection.snapshot().clone();
        assert!(s1.ptr_eq(&s2));

        let mut owned = s1.to_vec();
        owned[0].label = "edited".into();
        assert_eq!(s2[0].label, "");

        let ids: Vec<&str> = s1.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn snapshot_serializes_as_array() {
        let collection = Collection::build(vec![item("a", "x")]).collection;
        let json = serde_json::to_value(collection.snapshot()).unwrap();
        assert_eq!(json, serde_json::json!([{"id": "a", "label": "x"}]));
    }
}
