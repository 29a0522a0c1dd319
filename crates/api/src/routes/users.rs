//! Profile and address-book route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use orchard_core::{AddressId, AddressKind, Phone};

use crate::db::AddressRepository;
use crate::db::UserRepository;
use crate::db::addresses::{AddressChanges, NewAddress};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::address::UserAddress;
use crate::models::user::User;
use crate::services::AuthService;
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: User,
    pub addresses: Vec<UserAddress>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct AddressListResponse {
    pub addresses: Vec<UserAddress>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAddressRequest {
    pub full_name: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub address_type: AddressKind,
    #[serde(default)]
    pub is_default: bool,
}

fn default_country() -> String {
    "India".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAddressRequest {
    pub full_name: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AddressResponse {
    pub message: String,
    pub address: UserAddress,
}

// =============================================================================
// Profile Handlers
// =============================================================================

/// Get the caller's profile with their address book.
///
/// GET /api/users/profile
///
/// # Errors
///
/// Returns 500 for database failures.
pub async fn get_profile(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
) -> Result<Json<ProfileResponse>> {
    let addresses = AddressRepository::new(state.pool())
        .list_for_user(current.user.id)
        .await?;

    Ok(Json(ProfileResponse {
        user: current.user,
        addresses,
    }))
}

/// Partially update the caller's profile.
///
/// PUT /api/users/profile
///
/// # Errors
///
/// Returns 400 for no fields or a bad phone number.
pub async fn update_profile(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>> {
    if req.first_name.is_none() && req.last_name.is_none() && req.phone.is_none() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    let phone = req
        .phone
        .as_deref()
        .map(Phone::parse)
        .transpose()
        .map_err(|e| AppError::BadRequest(format!("invalid phone number: {e}")))?;

    let user = UserRepository::new(state.pool())
        .update_profile(
            current.user.id,
            req.first_name.as_deref(),
            req.last_name.as_deref(),
            phone.as_ref(),
        )
        .await?;

    Ok(Json(UserResponse {
        message: "Profile updated successfully".to_string(),
        user,
    }))
}

/// Change the caller's password.
///
/// PUT /api/users/change-password
///
/// # Errors
///
/// Returns 401 for a wrong current password, 400 for a weak new one.
pub async fn change_password(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let auth = AuthService::new(
        state.pool(),
        state.token_signer(),
        state.config().token_ttl_days,
    );
    auth.change_password(current.user.id, &req.current_password, &req.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password changed successfully.".to_string(),
    }))
}

// =============================================================================
// Address Handlers
// =============================================================================

/// List the caller's addresses, defaults first.
///
/// GET /api/users/addresses
///
/// # Errors
///
/// Returns 500 for database failures.
pub async fn list_addresses(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
) -> Result<Json<AddressListResponse>> {
    let addresses = AddressRepository::new(state.pool())
        .list_for_user(current.user.id)
        .await?;

    Ok(Json(AddressListResponse { addresses }))
}

/// Add a new address.
///
/// POST /api/users/addresses
///
/// # Errors
///
/// Returns 400 for validation failures.
pub async fn add_address(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Json(req): Json<CreateAddressRequest>,
) -> Result<(StatusCode, Json<AddressResponse>)> {
    for (value, field) in [
        (&req.full_name, "fullName"),
        (&req.address_line1, "addressLine1"),
        (&req.city, "city"),
        (&req.state, "state"),
        (&req.postal_code, "postalCode"),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::BadRequest(format!("{field} is required")));
        }
    }

    if let Some(phone) = req.phone.as_deref() {
        Phone::parse(phone)
            .map_err(|e| AppError::BadRequest(format!("invalid phone number: {e}")))?;
    }

    let address = AddressRepository::new(state.pool())
        .create(
            current.user.id,
            NewAddress {
                address_type: req.address_type,
                is_default: req.is_default,
                full_name: req.full_name.trim(),
                address_line1: req.address_line1.trim(),
                address_line2: req.address_line2.as_deref(),
                city: req.city.trim(),
                state: req.state.trim(),
                postal_code: req.postal_code.trim(),
                country: &req.country,
                phone: req.phone.as_deref(),
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AddressResponse {
            message: "Address added successfully".to_string(),
            address,
        }),
    ))
}

/// Partially update an owned address.
///
/// PUT /api/users/addresses/{id}
///
/// # Errors
///
/// Returns 404 when the address is missing or not owned by the caller.
pub async fn update_address(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Path(id): Path<AddressId>,
    Json(req): Json<UpdateAddressRequest>,
) -> Result<Json<AddressResponse>> {
    let no_changes = req.full_name.is_none()
        && req.address_line1.is_none()
        && req.address_line2.is_none()
        && req.city.is_none()
        && req.state.is_none()
        && req.postal_code.is_none()
        && req.country.is_none()
        && req.phone.is_none();
    if no_changes {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    let repo = AddressRepository::new(state.pool());
    let address = repo
        .update(
            id,
            current.user.id,
            AddressChanges {
                full_name: req.full_name.as_deref(),
                address_line1: req.address_line1.as_deref(),
                address_line2: req.address_line2.as_deref(),
                city: req.city.as_deref(),
                state: req.state.as_deref(),
                postal_code: req.postal_code.as_deref(),
                country: req.country.as_deref(),
                phone: req.phone.as_deref(),
            },
        )
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => AppError::NotFound("Address".to_string()),
            other => AppError::Database(other),
        })?;

    Ok(Json(AddressResponse {
        message: "Address updated successfully".to_string(),
        address,
    }))
}

/// Delete an owned address.
///
/// DELETE /api/users/addresses/{id}
///
/// # Errors
///
/// Returns 404 when the address is missing or not owned by the caller.
pub async fn delete_address(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Path(id): Path<AddressId>,
) -> Result<Json<MessageResponse>> {
    let deleted = AddressRepository::new(state.pool())
        .delete(id, current.user.id)
        .await?;

    if !deleted {
        return Err(AppError::NotFound("Address".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "Address deleted successfully".to_string(),
    }))
}

/// Make an owned address the default of its type.
///
/// PUT /api/users/addresses/{id}/default
///
/// # Errors
///
/// Returns 404 when the address is missing or not owned by the caller.
pub async fn set_default_address(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Path(id): Path<AddressId>,
) -> Result<Json<MessageResponse>> {
    AddressRepository::new(state.pool())
        .set_default(id, current.user.id)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => AppError::NotFound("Address".to_string()),
            other => AppError::Database(other),
        })?;

    Ok(Json(MessageResponse {
        message: "Default address updated successfully".to_string(),
    }))
}
