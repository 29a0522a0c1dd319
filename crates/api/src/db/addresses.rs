//! User address book repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use orchard_core::{AddressId, AddressKind, UserId};

use super::RepositoryError;
use crate::models::address::UserAddress;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: Uuid,
    user_id: Uuid,
    address_type: String,
    is_default: bool,
    full_name: String,
    address_line1: String,
    address_line2: Option<String>,
    city: String,
    state: String,
    postal_code: String,
    country: String,
    phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AddressRow> for UserAddress {
    type Error = RepositoryError;

    fn try_from(row: AddressRow) -> Result<Self, Self::Error> {
        let address_type: AddressKind = row.address_type.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid address type in database: {e}"))
        })?;

        Ok(Self {
            id: AddressId::new(row.id),
            user_id: UserId::new(row.user_id),
            address_type,
            is_default: row.is_default,
            full_name: row.full_name,
            address_line1: row.address_line1,
            address_line2: row.address_line2,
            city: row.city,
            state: row.state,
            postal_code: row.postal_code,
            country: row.country,
            phone: row.phone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const ADDRESS_COLUMNS: &str = "id, user_id, address_type, is_default, full_name, address_line1, \
     address_line2, city, state, postal_code, country, phone, created_at, updated_at";

/// Fields for creating a new address.
#[derive(Debug)]
pub struct NewAddress<'a> {
    pub address_type: AddressKind,
    pub is_default: bool,
    pub full_name: &'a str,
    pub address_line1: &'a str,
    pub address_line2: Option<&'a str>,
    pub city: &'a str,
    pub state: &'a str,
    pub postal_code: &'a str,
    pub country: &'a str,
    pub phone: Option<&'a str>,
}

/// Optional fields for a partial address update; `None` leaves a field as-is.
#[derive(Debug, Default)]
pub struct AddressChanges<'a> {
    pub full_name: Option<&'a str>,
    pub address_line1: Option<&'a str>,
    pub address_line2: Option<&'a str>,
    pub city: Option<&'a str>,
    pub state: Option<&'a str>,
    pub postal_code: Option<&'a str>,
    pub country: Option<&'a str>,
    pub phone: Option<&'a str>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user address operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all addresses for a user, defaults first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<UserAddress>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM user_addresses \
             WHERE user_id = $1 \
             ORDER BY is_default DESC, created_at DESC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get one address owned by the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        id: AddressId,
        user_id: UserId,
    ) -> Result<Option<UserAddress>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM user_addresses WHERE id = $1 AND user_id = $2"
        ))
        .bind(id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a new address; when flagged default, clears other defaults of
    /// the same type first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        address: NewAddress<'_>,
    ) -> Result<UserAddress, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if address.is_default {
            sqlx::query(
                "UPDATE user_addresses SET is_default = FALSE \
                 WHERE user_id = $1 AND address_type = $2",
            )
            .bind(user_id.as_uuid())
            .bind(address.address_type.to_string())
            .execute(&mut *tx)
            .await?;
        }

        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "INSERT INTO user_addresses ( \
                user_id, address_type, is_default, full_name, address_line1, address_line2, \
                city, state, postal_code, country, phone \
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(user_id.as_uuid())
        .bind(address.address_type.to_string())
        .bind(address.is_default)
        .bind(address.full_name)
        .bind(address.address_line1)
        .bind(address.address_line2)
        .bind(address.city)
        .bind(address.state)
        .bind(address.postal_code)
        .bind(address.country)
        .bind(address.phone)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        row.try_into()
    }

    /// Partially update an address owned by the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no owned address matches.
    pub async fn update(
        &self,
        id: AddressId,
        user_id: UserId,
        changes: AddressChanges<'_>,
    ) -> Result<UserAddress, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "UPDATE user_addresses SET \
                full_name = COALESCE($1, full_name), \
                address_line1 = COALESCE($2, address_line1), \
                address_line2 = COALESCE($3, address_line2), \
                city = COALESCE($4, city), \
                state = COALESCE($5, state), \
                postal_code = COALESCE($6, postal_code), \
                country = COALESCE($7, country), \
                phone = COALESCE($8, phone), \
                updated_at = NOW() \
             WHERE id = $9 AND user_id = $10 \
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(changes.full_name)
        .bind(changes.address_line1)
        .bind(changes.address_line2)
        .bind(changes.city)
        .bind(changes.state)
        .bind(changes.postal_code)
        .bind(changes.country)
        .bind(changes.phone)
        .bind(id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Delete an address owned by the user.
    ///
    /// Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: AddressId, user_id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM user_addresses WHERE id = $1 AND user_id = $2")
            .bind(id.as_uuid())
            .bind(user_id.as_uuid())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Make an address the default of its type, clearing any other default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no owned address matches.
    pub async fn set_default(&self, id: AddressId, user_id: UserId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(String,)> = sqlx::query_as(
            "SELECT address_type FROM user_addresses WHERE id = $1 AND user_id = $2",
        )
        .bind(id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        let Some((address_type,)) = row else {
            return Err(RepositoryError::NotFound);
        };

        sqlx::query(
            "UPDATE user_addresses SET is_default = FALSE \
             WHERE user_id = $1 AND address_type = $2",
        )
        .bind(user_id.as_uuid())
        .bind(&address_type)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE user_addresses SET is_default = TRUE WHERE id = $1 AND user_id = $2",
        )
        .bind(id.as_uuid())
        .bind(user_id.as_uuid())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }
}
