//! The panel's license subscription.

use crate::{action::ActionKinds, domain, entity::Entity, error::Result, Action};
use serde::{Deserialize, Serialize};

pub const SYNC: &str = "subscription.sync";
pub const CHANGE: &str = "subscription.change";

/// Kinds the subscription store reacts to.
pub const KINDS: ActionKinds = ActionKinds::new().sync(SYNC).change(CHANGE);

/// Subscription state as reported by the license server.
///
/// There is no separate id; the license url key identifies it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subscription {
    pub url_key: String,
    pub active: bool,
    pub status: String,
    pub plan: String,
    pub quantity: Option<u32>,
    pub amount: Option<u64>,
    pub period_end: Option<String>,
    pub trial_end: Option<String>,
    pub cancel_at_period_end: bool,
}

impl Subscription {
    /// Whether the subscription is ending or has ended.
    pub fn is_canceling(&self) -> bool {
        self.cancel_at_period_end || self.status == "canceled"
    }
}

impl Entity for Subscription {
    fn id(&self) -> &str {
        &self.url_key
    }
}

/// The current subscription, or `None` when there is no license.
pub fn sync(subscription: Option<&Subscription>) -> Result<Action> {
    let action = Action::new(SYNC);
    match subscription {
        Some(sub) => Ok(action.entity(domain::to_value(sub)?)),
        None => Ok(action),
    }
}

/// The subscription was activated, canceled or had its payment updated.
pub fn change(subscription: &Subscription) -> Result<Action> {
    Ok(Action::new(CHANGE).entity(domain::to_value(subscription)?))
}
