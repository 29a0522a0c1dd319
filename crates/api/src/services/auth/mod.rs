//! Authentication service.
//!
//! Owns the identity flows: email/password signup and login, phone OTP
//! login-or-provision, Google login-or-provision, password changes, and
//! logout (token revocation). Token issuance is delegated to the
//! [`TokenSigner`]; the authentication gate consumes what this service
//! produces.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use rand::Rng;
use sqlx::PgPool;

use orchard_core::{Email, Phone, UserId};

use crate::db::{OtpRepository, RepositoryError, TokenBlacklistRepository, UserRepository};
use crate::models::user::User;
use crate::services::token::{TokenSigner, token_digest};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// OTP validity window.
const OTP_TTL_MINUTES: i64 = 10;

/// How long a revoked token stays on the blacklist, independent of the
/// token's own expiry.
const BLACKLIST_TTL_DAYS: i64 = 7;

/// Profile fields required when an OTP login provisions a new account.
#[derive(Debug)]
pub struct NewProfile<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    otps: OtpRepository<'a>,
    blacklist: TokenBlacklistRepository<'a>,
    signer: &'a TokenSigner,
    token_ttl: Duration,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(pool: &'a PgPool, signer: &'a TokenSigner, token_ttl_days: i64) -> Self {
        Self {
            users: UserRepository::new(pool),
            otps: OtpRepository::new(pool),
            blacklist: TokenBlacklistRepository::new(pool),
            signer,
            token_ttl: Duration::days(token_ttl_days),
        }
    }

    // =========================================================================
    // Email / Password
    // =========================================================================

    /// Register a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` / `InvalidPhone` for bad input,
    /// `WeakPassword` for short passwords, and `UserAlreadyExists` when the
    /// email or phone is taken.
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        phone: Option<&str>,
    ) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;
        let phone = phone.map(Phone::parse).transpose()?;
        validate_password(password)?;

        if self
            .users
            .exists_with_email_or_phone(&email, phone.as_ref())
            .await?
        {
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create_with_password(&email, &password_hash, first_name, last_name, phone.as_ref())
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        let token = self.signer.issue(user.id, self.token_ttl);

        tracing::info!(user_id = %user.id, "user registered");

        Ok((user, token))
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is
    /// wrong, `AccountDeactivated` for disabled accounts.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        let email = Email::parse(&email.to_lowercase())?;

        let (user, password_hash) = self
            .users
            .get_for_login(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AuthError::AccountDeactivated);
        }

        // Phone/Google-provisioned accounts have no password to check
        let password_hash = password_hash.ok_or(AuthError::InvalidCredentials)?;
        verify_password(password, &password_hash)?;

        let token = self.signer.issue(user.id, self.token_ttl);

        Ok((user, token))
    }

    /// Change the caller's password after verifying the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the current password is
    /// wrong or the account has none, `WeakPassword` for a bad new one.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let current_hash = self
            .users
            .get_password_hash(user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(current_password, &current_hash)?;
        validate_password(new_password)?;

        let new_hash = hash_password(new_password)?;
        self.users.set_password_hash(user_id, &new_hash).await?;

        tracing::info!(user_id = %user_id, "password changed");

        Ok(())
    }

    // =========================================================================
    // Phone OTP
    // =========================================================================

    /// Generate and persist a one-time passcode for a phone number.
    ///
    /// Returns the code so the caller can hand it to the SMS collaborator
    /// (or log it in development). No rate limiting here.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidPhone` for bad input.
    pub async fn send_otp(&self, phone: &str) -> Result<String, AuthError> {
        let phone = Phone::parse(phone)?;
        let code = generate_otp();
        let expires_at = Utc::now() + Duration::minutes(OTP_TTL_MINUTES);

        self.otps.save(&phone, &code, expires_at).await?;

        Ok(code)
    }

    /// Verify an OTP and log in, provisioning a new verified phone account
    /// when none exists.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidOrExpiredOtp` when the code doesn't match,
    /// `MissingProfileFields` when a new account lacks profile data, and
    /// `AccountDeactivated` for disabled accounts.
    pub async fn verify_otp(
        &self,
        phone: &str,
        code: &str,
        profile: Option<NewProfile<'_>>,
    ) -> Result<(User, String), AuthError> {
        let phone = Phone::parse(phone)?;

        if !self.otps.consume(&phone, code).await? {
            return Err(AuthError::InvalidOrExpiredOtp);
        }

        let user = match self.users.get_by_phone(&phone).await? {
            Some(user) => user,
            None => {
                let Some(profile) = profile else {
                    return Err(AuthError::MissingProfileFields);
                };
                let email = Email::parse(profile.email)?;
                self.users
                    .create_phone_user(&email, &phone, profile.first_name, profile.last_name)
                    .await
                    .map_err(|e| match e {
                        RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                        other => AuthError::Repository(other),
                    })?
            }
        };

        if !user.is_active {
            return Err(AuthError::AccountDeactivated);
        }

        let token = self.signer.issue(user.id, self.token_ttl);

        Ok((user, token))
    }

    // =========================================================================
    // Google OAuth
    // =========================================================================

    /// Login or provision an account from a verified Google identity.
    ///
    /// Links the Google id (and avatar) onto an existing email account on
    /// first Google login.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccountDeactivated` for disabled accounts.
    pub async fn google_login(
        &self,
        google_id: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
        avatar_url: Option<&str>,
    ) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;

        let user = match self.users.get_by_google_id_or_email(google_id, &email).await? {
            Some((user, linked_google_id)) => {
                if linked_google_id.is_none() {
                    self.users
                        .link_google_id(user.id, google_id, avatar_url)
                        .await?;
                }
                user
            }
            None => self
                .users
                .create_google_user(google_id, &email, first_name, last_name, avatar_url)
                .await
                .map_err(|e| match e {
                    RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                    other => AuthError::Repository(other),
                })?,
        };

        if !user.is_active {
            return Err(AuthError::AccountDeactivated);
        }

        let token = self.signer.issue(user.id, self.token_ttl);

        Ok((user, token))
    }

    // =========================================================================
    // Logout
    // =========================================================================

    /// Revoke the presented token by blacklisting its digest.
    ///
    /// The blacklist horizon is fixed at seven days regardless of the
    /// token's own expiry, so the entry outlives any token we issue.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the insert fails.
    pub async fn logout(&self, user_id: UserId, token: &str) -> Result<(), AuthError> {
        let expires_at = Utc::now() + Duration::days(BLACKLIST_TTL_DAYS);
        self.blacklist
            .revoke(user_id, &token_digest(token), expires_at)
            .await?;

        tracing::info!(user_id = %user_id, "user logged out");

        Ok(())
    }
}

/// Generate a six-digit numeric OTP code.
#[must_use]
pub fn generate_otp() -> String {
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_otp_is_six_digits() {
        for _ in 0..50 {
            let code = generate_otp();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret").is_ok());
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct-horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct-horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong-horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_password_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
