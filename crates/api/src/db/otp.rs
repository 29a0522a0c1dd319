//! One-time passcode repository.
//!
//! OTP rows are consumed by setting `is_used`, never deleted, so a phone
//! number accumulates a history of issued codes.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use orchard_core::Phone;

use super::RepositoryError;

/// Repository for OTP code operations.
pub struct OtpRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OtpRepository<'a> {
    /// Create a new OTP repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a freshly generated code with its expiry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn save(
        &self,
        phone: &Phone,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO otp_codes (phone, otp_code, expires_at) VALUES ($1, $2, $3)")
            .bind(phone.as_str())
            .bind(code)
            .bind(expires_at)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Verify and consume a code for a phone number.
    ///
    /// Matches the newest unexpired, unused row; on a match the row's
    /// `is_used` flag is set so the code cannot be replayed. Returns whether
    /// a code was consumed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn consume(&self, phone: &Phone, code: &str) -> Result<bool, RepositoryError> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM otp_codes \
             WHERE phone = $1 AND otp_code = $2 AND expires_at > NOW() AND is_used = FALSE \
             ORDER BY created_at DESC \
             LIMIT 1",
        )
        .bind(phone.as_str())
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        let Some((id,)) = row else {
            return Ok(false);
        };

        sqlx::query("UPDATE otp_codes SET is_used = TRUE WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(true)
    }
}
