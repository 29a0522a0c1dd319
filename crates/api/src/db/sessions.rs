//! Bearer-token blacklist repository.
//!
//! Logout inserts the SHA-256 digest of the presented token here; the
//! authentication gate rejects any token whose digest has an unexpired row.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use orchard_core::UserId;

use super::RepositoryError;

/// Repository for token revocation entries.
pub struct TokenBlacklistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TokenBlacklistRepository<'a> {
    /// Create a new blacklist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a revocation entry for a token digest.
    ///
    /// Tokens are unique per issuance, but re-revoking the same token (double
    /// logout) is harmless, so unique violations are swallowed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn revoke(
        &self,
        user_id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO user_sessions (user_id, token_hash, expires_at) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (token_hash) DO NOTHING",
        )
        .bind(user_id.as_uuid())
        .bind(token_hash)
        .bind(expires_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Whether a token digest has an unexpired revocation entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_revoked(&self, token_hash: &str) -> Result<bool, RepositoryError> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM user_sessions WHERE token_hash = $1 AND expires_at > NOW()",
        )
        .bind(token_hash)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.is_some())
    }
}
