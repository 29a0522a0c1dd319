//! Identity route handlers.
//!
//! Signup, login, phone OTP, Google login, caller resolution, and logout.
//! All issuance paths return the user and a freshly signed bearer token.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::user::User;
use crate::services::AuthService;
use crate::services::auth::NewProfile;
use crate::state::AppState;

/// Minimum length for first/last names.
const MIN_NAME_LENGTH: usize = 2;

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub phone: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub phone: String,
    pub otp: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleRequest {
    pub google_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
}

/// Response for token-issuing endpoints.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: User,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a new user with email and password.
///
/// POST /api/auth/signup
///
/// # Errors
///
/// Returns 400 for validation failures, 409 when the account exists.
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    validate_name(&req.first_name, "firstName")?;
    validate_name(&req.last_name, "lastName")?;

    let auth = auth_service(&state);
    let (user, token) = auth
        .signup(
            &req.email,
            &req.password,
            req.first_name.trim(),
            req.last_name.trim(),
            req.phone.as_deref(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            user,
            token,
        }),
    ))
}

/// Login with email and password.
///
/// POST /api/auth/login
///
/// # Errors
///
/// Returns 401 for bad credentials or a deactivated account.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let auth = auth_service(&state);
    let (user, token) = auth.login(&req.email, &req.password).await?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        user,
        token,
    }))
}

/// Issue a one-time passcode for phone verification.
///
/// POST /api/auth/send-otp
///
/// SMS delivery is an external collaborator; the code is logged so local
/// development can complete the flow without one.
///
/// # Errors
///
/// Returns 400 for an invalid phone number.
pub async fn send_otp(
    State(state): State<AppState>,
    Json(req): Json<SendOtpRequest>,
) -> Result<Json<MessageResponse>> {
    let auth = auth_service(&state);
    let code = auth.send_otp(&req.phone).await?;

    tracing::info!(phone = %req.phone, code = %code, "OTP issued");

    Ok(Json(MessageResponse {
        message: "OTP sent successfully.".to_string(),
    }))
}

/// Verify an OTP and login, provisioning a new account when needed.
///
/// POST /api/auth/verify-otp
///
/// # Errors
///
/// Returns 400 for a bad/expired code or missing profile fields for a new
/// account, 401 for a deactivated account.
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<AuthResponse>> {
    let profile = match (&req.first_name, &req.last_name, &req.email) {
        (Some(first_name), Some(last_name), Some(email)) => Some(NewProfile {
            first_name,
            last_name,
            email,
        }),
        _ => None,
    };

    let auth = auth_service(&state);
    let (user, token) = auth.verify_otp(&req.phone, &req.otp, profile).await?;

    Ok(Json(AuthResponse {
        message: "OTP verified successfully".to_string(),
        user,
        token,
    }))
}

/// Login or provision a user from a verified Google identity.
///
/// POST /api/auth/google
///
/// # Errors
///
/// Returns 400 for missing fields, 401 for a deactivated account.
pub async fn google(
    State(state): State<AppState>,
    Json(req): Json<GoogleRequest>,
) -> Result<Json<AuthResponse>> {
    if req.google_id.is_empty() {
        return Err(AppError::BadRequest("googleId is required".to_string()));
    }
    validate_name(&req.first_name, "firstName")?;
    validate_name(&req.last_name, "lastName")?;

    let auth = auth_service(&state);
    let (user, token) = auth
        .google_login(
            &req.google_id,
            &req.email,
            &req.first_name,
            &req.last_name,
            req.avatar_url.as_deref(),
        )
        .await?;

    Ok(Json(AuthResponse {
        message: "Google authentication successful".to_string(),
        user,
        token,
    }))
}

/// Resolve the current caller.
///
/// GET /api/auth/me
pub async fn me(RequireUser(current): RequireUser) -> Json<MeResponse> {
    Json(MeResponse { user: current.user })
}

/// Blacklist the presented token.
///
/// POST /api/auth/logout
///
/// # Errors
///
/// Returns 500 if the revocation insert fails.
pub async fn logout(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
) -> Result<Json<MessageResponse>> {
    let auth = auth_service(&state);
    auth.logout(current.user.id, &current.token).await?;

    Ok(Json(MessageResponse {
        message: "Logged out successfully.".to_string(),
    }))
}

// =============================================================================
// Helpers
// =============================================================================

fn auth_service(state: &AppState) -> AuthService<'_> {
    AuthService::new(
        state.pool(),
        state.token_signer(),
        state.config().token_ttl_days,
    )
}

fn validate_name(value: &str, field: &str) -> Result<()> {
    if value.trim().len() < MIN_NAME_LENGTH {
        return Err(AppError::BadRequest(format!(
            "{field} must be at least {MIN_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}
