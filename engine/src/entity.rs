//! The entity contract.

use serde::de::DeserializeOwned;

/// A domain record held by a store.
///
/// The engine treats entities as opaque values: the only field it ever reads
/// is the id used for indexing. Entities arrive as JSON in action payloads and
/// are decoded with serde.
pub trait Entity: Clone + std::fmt::Debug + DeserializeOwned + 'static {
    /// Stable identifier, unique within one collection.
    fn id(&self) -> &str;
}

/// Decode one entity payload.
pub(crate) fn decode<E: Entity>(value: &serde_json::Value) -> crate::Result<E> {
    E::deserialize(value).map_err(|e| crate::Error::InvalidPayload(e.to_string()))
}

/// Decode a list of entity payloads, failing on the first bad one.
pub(crate) fn decode_all<E: Entity>(values: &[serde_json::Value]) -> crate::Result<Vec<E>> {
    values.iter().map(decode::<E>).collect()
}

