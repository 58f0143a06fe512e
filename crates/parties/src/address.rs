use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopper_core::{AddressId, Entity, UserId};

/// Shipping or billing address kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    Shipping,
    Billing,
    Both,
}

/// A buyer's saved address.
///
/// Orders reference addresses by id; ownership (`user_id`) is validated at
/// checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    pub is_default: bool,
    pub kind: AddressKind,
    pub created_at: DateTime<Utc>,
}

impl Address {
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}

impl Entity for Address {
    type Id = AddressId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
