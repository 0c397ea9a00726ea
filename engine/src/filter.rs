//! Filters attached to a store's view state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A field name to predicate value mapping.
///
/// Two filters are equal when they hold the same fields with the same values,
/// regardless of how or where they were built. The store itself never
/// evaluates a filter; it is forwarded to whoever fetches the next page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter {
    fields: BTreeMap<String, serde_json::Value>,
}

impl Filter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, builder style.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Set a field, replacing any previous value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Get a field's value.
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.fields.get(field)
    }

    /// Remove a field.
    pub fn remove(&mut self, field: &str) -> Option<serde_json::Value> {
        self.fields.remove(field)
    }

    /// Iterate fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.fields.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the filter has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<serde_json::Value>> FromIterator<(K, V)> for Filter {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Whether replacing `current` with `next` must send the view back to page 0.
///
/// Going from no filter to some filter (or back) is always material, even for
/// an empty filter. Otherwise any field added, removed or changed is material.
pub fn is_material_change(current: Option<&Filter>, next: Option<&Filter>) -> bool {
    match (current, next) {
        (None, None) => false,
        (Some(a), Some(b)) => a != b,
        _ => true,
    }
}
