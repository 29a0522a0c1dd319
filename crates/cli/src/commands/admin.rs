//! Admin role management command.

use orchard_core::{AdminRole, Email};

use orchard_api::db::UserRepository;

use super::{CommandError, connect};

/// Grant an admin role to an existing user, identified by email.
///
/// # Errors
///
/// Returns `CommandError` if the user doesn't exist, the role string is
/// invalid, or the user already holds a role.
pub async fn grant(email: &str, role: &str) -> Result<(), CommandError> {
    let email = Email::parse(email).map_err(|e| CommandError::Invalid(e.to_string()))?;
    let role: AdminRole = role
        .parse()
        .map_err(|e: String| CommandError::Invalid(e))?;

    let pool = connect().await?;
    let users = UserRepository::new(&pool);

    let user = users
        .get_by_email(&email)
        .await
        .map_err(|e| CommandError::Invalid(e.to_string()))?
        .ok_or_else(|| CommandError::Invalid(format!("no user with email {email}")))?;

    let record = users
        .grant_admin(user.id, role)
        .await
        .map_err(|e| CommandError::Invalid(e.to_string()))?;

    tracing::info!(user_id = %user.id, role = %record.role, "admin role granted");
    Ok(())
}
