//! Users.

use crate::{
    action::ActionKinds, domain, entity::Entity, error::Result, Action, EntityId, Filter,
};
use serde::{Deserialize, Serialize};

pub const SYNC: &str = "user.sync";
pub const TRAVERSE: &str = "user.traverse";
pub const FILTER: &str = "user.filter";
pub const CHANGE: &str = "user.change";
pub const REMOVE: &str = "user.remove";

/// Kinds the users store reacts to.
pub const KINDS: ActionKinds = ActionKinds::new()
    .sync(SYNC)
    .traverse(TRAVERSE)
    .filter(FILTER)
    .change(CHANGE)
    .remove(REMOVE);

/// A panel user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub administrator: String,
    #[serde(default)]
    pub disabled: bool,
}

impl Entity for User {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A fetched page of users.
pub fn sync(users: &[User], count: i64) -> Result<Action> {
    Ok(Action::new(SYNC)
        .entities(domain::to_values(users)?)
        .count(count))
}

/// Move the users list to `page`.
pub fn traverse(page: i64) -> Action {
    Action::new(TRAVERSE).page(page)
}

/// Replace the users filter. The usual fields are `type`, `administrator`,
/// `disabled` and `role`.
pub fn filter(filter: Option<Filter>) -> Action {
    Action::new(FILTER).filter(filter)
}

/// A single user was saved.
pub fn change(user: &User) -> Result<Action> {
    Ok(Action::new(CHANGE).entity(domain::to_value(user)?))
}

/// A user was deleted.
pub fn remove(id: impl Into<EntityId>) -> Action {
    Action::new(REMOVE).id(id)
}
