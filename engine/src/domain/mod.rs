//! Domain entities of the control panel and their action tables.
//!
//! Each submodule declares one entity type, the kind strings its store
//! reacts to, and small constructors that build well-formed actions from
//! typed values for whoever performs the I/O.

pub mod certificate;
pub mod device;
pub mod subscription;
pub mod user;

pub use certificate::{Certificate, CertificateInfo};
pub use device::Device;
pub use subscription::Subscription;
pub use user::User;

use crate::{error::Result, Error};
use serde::Serialize;

/// Encode one entity for an action payload.
pub(crate) fn to_value<T: Serialize>(entity: &T) -> Result<serde_json::Value> {
    serde_json::to_value(entity).map_err(|e| Error::InvalidPayload(e.to_string()))
}

/// Encode a page of entities for an action payload.
pub(crate) fn to_values<T: Serialize>(entities: &[T]) -> Result<Vec<serde_json::Value>> {
    entities.iter().map(to_value::<T>).collect()
}
