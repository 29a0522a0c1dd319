//! Authentication gate: bearer-token extractors.
//!
//! Resolution order for a presented `Authorization: Bearer <token>` header:
//! signature + expiry, blacklist (revoked-at-logout tokens), user lookup,
//! active flag. [`RequireAdmin`] additionally requires an `admin_users` row.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn protected_handler(
//!     RequireUser(current): RequireUser,
//! ) -> impl IntoResponse {
//!     format!("Hello, {}!", current.user.email)
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use thiserror::Error;

use crate::db::{RepositoryError, TokenBlacklistRepository, UserRepository};
use crate::error::{AppError, set_sentry_user};
use crate::models::user::{AdminRecord, User};
use crate::services::token::{TokenError, token_digest};
use crate::state::AppState;

/// Errors from the authentication gate.
#[derive(Debug, Error)]
pub enum GateError {
    /// No bearer token was supplied.
    #[error("access denied, no token provided")]
    Unauthenticated,

    /// The token failed signature or structural checks.
    #[error("invalid token")]
    InvalidToken,

    /// The token's expiry has passed.
    #[error("token expired")]
    TokenExpired,

    /// The token was invalidated at logout.
    #[error("token has been invalidated")]
    TokenRevoked,

    /// No user exists for the token's subject.
    #[error("user not found")]
    UserNotFound,

    /// The account's active flag is off.
    #[error("account is deactivated")]
    AccountDeactivated,

    /// The caller is not an administrator.
    #[error("admin access required")]
    Forbidden,

    /// Underlying repository failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// The authenticated caller, attached for downstream handlers.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Resolved user record.
    pub user: User,
    /// The raw bearer token, kept for logout revocation.
    pub token: String,
}

/// Extractor that requires an authenticated user.
pub struct RequireUser(pub CurrentUser);

/// Extractor that optionally resolves the caller.
///
/// Unlike [`RequireUser`], this never rejects: any resolution failure yields
/// `None` and the request proceeds unauthenticated.
pub struct OptionalUser(pub Option<CurrentUser>);

/// Extractor that requires an authenticated administrator.
pub struct RequireAdmin {
    /// The authenticated caller.
    pub current: CurrentUser,
    /// The caller's admin role record.
    pub admin: AdminRecord,
}

/// Resolve the bearer token in `parts` to a user, or fail with the specific
/// gate error.
async fn resolve_user(parts: &Parts, state: &AppState) -> Result<CurrentUser, GateError> {
    let token = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(GateError::Unauthenticated)?
        .to_owned();

    let claims = state.token_signer().verify(&token).map_err(|e| match e {
        TokenError::Expired => GateError::TokenExpired,
        TokenError::Malformed | TokenError::InvalidSignature => GateError::InvalidToken,
    })?;

    let blacklist = TokenBlacklistRepository::new(state.pool());
    if blacklist.is_revoked(&token_digest(&token)).await? {
        return Err(GateError::TokenRevoked);
    }

    let users = UserRepository::new(state.pool());
    let user = users
        .get_by_id(claims.sub)
        .await?
        .ok_or(GateError::UserNotFound)?;

    if !user.is_active {
        return Err(GateError::AccountDeactivated);
    }

    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok(CurrentUser { user, token })
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let current = resolve_user(parts, state).await?;
        Ok(Self(current))
    }
}

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Continue without authentication on any failure
        Ok(Self(resolve_user(parts, state).await.ok()))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let current = resolve_user(parts, state).await?;

        let users = UserRepository::new(state.pool());
        let admin = users
            .get_admin_record(current.user.id)
            .await
            .map_err(GateError::from)?
            .ok_or(GateError::Forbidden)?;

        Ok(Self { current, admin })
    }
}
