//! User address book model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use orchard_core::{AddressId, AddressKind, UserId};

/// An address book entry owned by a user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAddress {
    pub id: AddressId,
    pub user_id: UserId,
    pub address_type: AddressKind,
    pub is_default: bool,
    pub full_name: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
