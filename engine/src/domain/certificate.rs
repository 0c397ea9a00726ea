//! TLS certificates.

use crate::{action::ActionKinds, domain, entity::Entity, error::Result, Action, EntityId};
use serde::{Deserialize, Serialize};

pub const SYNC: &str = "certificate.sync";
pub const CHANGE: &str = "certificate.change";
pub const REMOVE: &str = "certificate.remove";

/// Kinds the certificates store reacts to. The list is not paginated.
pub const KINDS: ActionKinds = ActionKinds::new().sync(SYNC).change(CHANGE).remove(REMOVE);

/// Parsed details of a certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateInfo {
    pub signature_alg: Option<String>,
    pub public_key_alg: Option<String>,
    pub issuer: Option<String>,
    pub issued_on: Option<String>,
    pub expires_on: Option<String>,
    pub dns_names: Vec<String>,
}

/// A certificate, either uploaded or issued through ACME.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: EntityId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub certificate: Option<String>,
    #[serde(default)]
    pub info: Option<CertificateInfo>,
    #[serde(default)]
    pub acme_type: Option<String>,
    #[serde(default)]
    pub acme_auth: Option<String>,
    #[serde(default)]
    pub acme_secret: Option<String>,
    #[serde(default)]
    pub acme_domains: Vec<String>,
}

impl Entity for Certificate {
    fn id(&self) -> &str {
        &self.id
    }
}

/// The full certificate list.
pub fn sync(certificates: &[Certificate]) -> Result<Action> {
    Ok(Action::new(SYNC)
        .entities(domain::to_values(certificates)?)
        .count(certificates.len() as i64))
}

/// A single certificate was saved.
pub fn change(certificate: &Certificate) -> Result<Action> {
    Ok(Action::new(CHANGE).entity(domain::to_value(certificate)?))
}

/// A certificate was deleted.
pub fn remove(id: impl Into<EntityId>) -> Action {
    Action::new(REMOVE).id(id)
}
