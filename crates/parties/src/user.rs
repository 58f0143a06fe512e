use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopper_core::{Entity, UserId};

/// Buyer identity summary, attached to order responses.
///
/// Identity management is an external collaborator; this is the read shape
/// the order core needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buyer {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Entity for Buyer {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
