//! Devices registered to a user (security keys, phones, SSH keys).
//!
//! The device list always belongs to one user. Loading another user's
//! devices empties the store, and responses that arrive for a user that is
//! no longer loaded are dropped.

use crate::{action::ActionKinds, domain, entity::Entity, error::Result, Action, EntityId};
use serde::{Deserialize, Serialize};

pub const LOAD: &str = "device.load";
pub const SYNC: &str = "device.sync";
pub const CHANGE: &str = "device.change";
pub const REMOVE: &str = "device.remove";

/// Kinds the devices store reacts to.
pub const KINDS: ActionKinds = ActionKinds::new()
    .load(LOAD)
    .sync(SYNC)
    .change(CHANGE)
    .remove(REMOVE);

/// A device owned by a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: EntityId,
    #[serde(default)]
    pub user: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub ssh_public_key: String,
}

impl Entity for Device {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Start showing the devices of `user_id`.
pub fn load(user_id: impl Into<EntityId>) -> Action {
    Action::new(LOAD).id(user_id)
}

/// The devices fetched for `user_id`.
pub fn sync(user_id: impl Into<EntityId>, devices: &[Device]) -> Result<Action> {
    Ok(Action::new(SYNC)
        .id(user_id)
        .entities(domain::to_values(devices)?)
        .count(devices.len() as i64))
}

/// A device was renamed or otherwise saved.
pub fn change(device: &Device) -> Result<Action> {
    Ok(Action::new(CHANGE).entity(domain::to_value(device)?))
}

/// A device was deleted.
pub fn remove(id: impl Into<EntityId>) -> Action {
    Action::new(REMOVE).id(id)
}
