//! User and administrator models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use orchard_core::{AdminRole, AdminUserId, AuthProvider, Email, Phone, UserId};

/// A customer account.
///
/// The password hash is never part of this struct; repositories return it
/// separately where verification needs it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub phone: Option<Phone>,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
    pub auth_provider: AuthProvider,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An administrator role record attached to a user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRecord {
    pub id: AdminUserId,
    pub user_id: UserId,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
}
