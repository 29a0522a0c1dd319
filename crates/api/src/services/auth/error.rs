//! Authentication service errors.

use thiserror::Error;

use orchard_core::{EmailError, PhoneError};

use crate::db::RepositoryError;

/// Errors from credential and OTP operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email/password combination is wrong (covers unknown accounts too, so
    /// responses don't reveal which half failed).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account's active flag is off.
    #[error("account is deactivated")]
    AccountDeactivated,

    /// An account already exists with this email or phone.
    #[error("user already exists with this email or phone")]
    UserAlreadyExists,

    /// Password fails the strength requirements.
    #[error("{0}")]
    WeakPassword(String),

    /// Email failed validation.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Phone number failed validation.
    #[error("invalid phone number: {0}")]
    InvalidPhone(#[from] PhoneError),

    /// OTP did not match, was already used, or has expired.
    #[error("invalid or expired OTP")]
    InvalidOrExpiredOtp,

    /// Provisioning a new account needs name and email.
    #[error("first name, last name, and email are required for new users")]
    MissingProfileFields,

    /// Password hashing failed.
    #[error("password hashing failed")]
    PasswordHash,

    /// Underlying repository failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
