//! User repository for database operations.
//!
//! Provides database access for customer accounts and administrator role
//! records. Queries use the runtime sqlx API with typed row structs.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use orchard_core::{
    AdminRole, AdminUserId, AuthProvider, Email, Phone, ResolvedPage, UserId,
};

use super::RepositoryError;
use crate::models::user::{AdminRecord, User};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    phone: Option<String>,
    first_name: String,
    last_name: String,
    avatar_url: Option<String>,
    auth_provider: String,
    is_verified: bool,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        let phone = row
            .phone
            .as_deref()
            .map(Phone::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid phone in database: {e}"))
            })?;

        let auth_provider: AuthProvider = row.auth_provider.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid auth provider in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            phone,
            first_name: row.first_name,
            last_name: row.last_name,
            avatar_url: row.avatar_url,
            auth_provider,
            is_verified: row.is_verified,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Internal row type for admin role records.
#[derive(Debug, sqlx::FromRow)]
struct AdminRow {
    id: Uuid,
    user_id: Uuid,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AdminRow> for AdminRecord {
    type Error = RepositoryError;

    fn try_from(row: AdminRow) -> Result<Self, Self::Error> {
        let role: AdminRole = row.role.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid admin role in database: {e}"))
        })?;

        Ok(Self {
            id: AdminUserId::new(row.id),
            user_id: UserId::new(row.user_id),
            role,
            created_at: row.created_at,
        })
    }
}

const USER_COLUMNS: &str = "id, email, phone, first_name, last_name, avatar_url, \
     auth_provider, is_verified, is_active, created_at, updated_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored data is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by their phone number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_phone(&self, phone: &Phone) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE phone = $1"
        ))
        .bind(phone.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by their Google account id, falling back to email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_google_id_or_email(
        &self,
        google_id: &str,
        email: &Email,
    ) -> Result<Option<(User, Option<String>)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct RowWithGoogle {
            #[sqlx(flatten)]
            user: UserRow,
            google_id: Option<String>,
        }

        let row = sqlx::query_as::<_, RowWithGoogle>(&format!(
            "SELECT {USER_COLUMNS}, google_id FROM users WHERE google_id = $1 OR email = $2"
        ))
        .bind(google_id)
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((r.user.try_into()?, r.google_id))),
            None => Ok(None),
        }
    }

    /// Whether a user already exists with the given email or phone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists_with_email_or_phone(
        &self,
        email: &Email,
        phone: Option<&Phone>,
    ) -> Result<bool, RepositoryError> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM users WHERE email = $1 OR ($2::text IS NOT NULL AND phone = $2)",
        )
        .bind(email.as_str())
        .bind(phone.map(Phone::as_str))
        .fetch_optional(self.pool)
        .await?;

        Ok(row.is_some())
    }

    /// Create a new email/password user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email or phone already exists.
    pub async fn create_with_password(
        &self,
        email: &Email,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
        phone: Option<&Phone>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (email, password_hash, first_name, last_name, phone, auth_provider, is_verified) \
             VALUES ($1, $2, $3, $4, $5, 'email', FALSE) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email.as_str())
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .bind(phone.map(Phone::as_str))
        .fetch_one(self.pool)
        .await
        .map_err(map_unique_violation)?;

        row.try_into()
    }

    /// Create a new phone-provisioned user (no password, pre-verified).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email or phone already exists.
    pub async fn create_phone_user(
        &self,
        email: &Email,
        phone: &Phone,
        first_name: &str,
        last_name: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (email, phone, first_name, last_name, auth_provider, is_verified) \
             VALUES ($1, $2, $3, $4, 'phone', TRUE) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email.as_str())
        .bind(phone.as_str())
        .bind(first_name)
        .bind(last_name)
        .fetch_one(self.pool)
        .await
        .map_err(map_unique_violation)?;

        row.try_into()
    }

    /// Create a new Google-provisioned user (no password, pre-verified).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create_google_user(
        &self,
        google_id: &str,
        email: &Email,
        first_name: &str,
        last_name: &str,
        avatar_url: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (google_id, email, first_name, last_name, avatar_url, auth_provider, is_verified) \
             VALUES ($1, $2, $3, $4, $5, 'google', TRUE) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(google_id)
        .bind(email.as_str())
        .bind(first_name)
        .bind(last_name)
        .bind(avatar_url)
        .fetch_one(self.pool)
        .await
        .map_err(map_unique_violation)?;

        row.try_into()
    }

    /// Attach a Google id (and avatar) to an existing account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn link_google_id(
        &self,
        user_id: UserId,
        google_id: &str,
        avatar_url: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET google_id = $1, avatar_url = COALESCE($2, avatar_url), \
             updated_at = NOW() WHERE id = $3",
        )
        .bind(google_id)
        .bind(avatar_url)
        .bind(user_id.as_uuid())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Partially update profile fields; `None` leaves a field unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        first_name: Option<&str>,
        last_name: Option<&str>,
        phone: Option<&Phone>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET \
                first_name = COALESCE($1, first_name), \
                last_name = COALESCE($2, last_name), \
                phone = COALESCE($3, phone), \
                updated_at = NOW() \
             WHERE id = $4 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(first_name)
        .bind(last_name)
        .bind(phone.map(Phone::as_str))
        .bind(user_id.as_uuid())
        .fetch_optional(self.pool)
        .await
        .map_err(map_unique_violation)?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Get a user's password hash by id (`None` for phone/Google accounts).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn get_password_hash(
        &self,
        user_id: UserId,
    ) -> Result<Option<String>, RepositoryError> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT password_hash FROM users WHERE id = $1")
                .bind(user_id.as_uuid())
                .fetch_optional(self.pool)
                .await?;

        row.map(|(hash,)| hash).ok_or(RepositoryError::NotFound)
    }

    /// Get a user and their password hash by email, for login.
    ///
    /// Returns `None` if no account exists for the email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_login(
        &self,
        email: &Email,
    ) -> Result<Option<(User, Option<String>)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct LoginRow {
            #[sqlx(flatten)]
            user: UserRow,
            password_hash: Option<String>,
        }

        let row = sqlx::query_as::<_, LoginRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((r.user.try_into()?, r.password_hash))),
            None => Ok(None),
        }
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_password_hash(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
                .bind(password_hash)
                .bind(user_id.as_uuid())
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Toggle a user's active flag (administrator operation).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_active(
        &self,
        user_id: UserId,
        is_active: bool,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET is_active = $1, updated_at = NOW() WHERE id = $2 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(is_active)
        .bind(user_id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// List users for the admin panel with optional search and status filter.
    ///
    /// Returns the page of users plus the total matching count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        search: Option<&str>,
        is_active: Option<bool>,
        page: ResolvedPage,
    ) -> Result<(Vec<User>, i64), RepositoryError> {
        let pattern = search.map(|s| format!("%{s}%"));

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE ($1::text IS NULL OR email ILIKE $1 OR first_name ILIKE $1 OR last_name ILIKE $1) \
               AND ($2::boolean IS NULL OR is_active = $2) \
             ORDER BY created_at DESC \
             LIMIT $3 OFFSET $4"
        ))
        .bind(pattern.as_deref())
        .bind(is_active)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM users \
             WHERE ($1::text IS NULL OR email ILIKE $1 OR first_name ILIKE $1 OR last_name ILIKE $1) \
               AND ($2::boolean IS NULL OR is_active = $2)",
        )
        .bind(pattern.as_deref())
        .bind(is_active)
        .fetch_one(self.pool)
        .await?;

        let users = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((users, total))
    }

    /// Total user count (dashboard).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Get the admin role record for a user, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_admin_record(
        &self,
        user_id: UserId,
    ) -> Result<Option<AdminRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminRow>(
            "SELECT id, user_id, role, created_at FROM admin_users WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Grant an admin role to a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already has a role.
    pub async fn grant_admin(
        &self,
        user_id: UserId,
        role: AdminRole,
    ) -> Result<AdminRecord, RepositoryError> {
        let row = sqlx::query_as::<_, AdminRow>(
            "INSERT INTO admin_users (user_id, role) VALUES ($1, $2) \
             RETURNING id, user_id, role, created_at",
        )
        .bind(user_id.as_uuid())
        .bind(role.to_string())
        .fetch_one(self.pool)
        .await
        .map_err(map_unique_violation)?;

        row.try_into()
    }
}

/// Map a unique-constraint violation to `RepositoryError::Conflict`.
fn map_unique_violation(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict("account already exists".to_owned());
    }
    RepositoryError::Database(e)
}
