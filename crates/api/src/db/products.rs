//! Product catalog repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use orchard_core::{CurrencyCode, ProductId, ResolvedPage};

use super::RepositoryError;
use crate::models::product::Product;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    price: Decimal,
    original_price: Option<Decimal>,
    currency: String,
    category: Option<String>,
    subcategory: Option<String>,
    images: Value,
    features: Value,
    specifications: Value,
    stock_quantity: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let currency: CurrencyCode = row.currency.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid currency in database: {e}"))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            original_price: row.original_price,
            currency,
            category: row.category,
            subcategory: row.subcategory,
            images: row.images,
            features: row.features,
            specifications: row.specifications,
            stock_quantity: row.stock_quantity,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const PRODUCT_COLUMNS: &str = "id, name, description, price, original_price, currency, category, \
     subcategory, images, features, specifications, stock_quantity, is_active, \
     created_at, updated_at";

// =============================================================================
// Sorting (whitelisted)
// =============================================================================

/// Whitelisted sort columns for catalog listings.
///
/// Sort input from the query string never reaches the SQL text directly;
/// it is parsed into this enum first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    #[default]
    CreatedAt,
    Price,
    Name,
}

impl ProductSort {
    /// The column name this sort maps to.
    #[must_use]
    pub const fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Price => "price",
            Self::Name => "name",
        }
    }

    /// Parse from a query-string value, falling back to the default.
    #[must_use]
    pub fn parse_or_default(s: Option<&str>) -> Self {
        match s {
            Some("price") => Self::Price,
            Some("name") => Self::Name,
            _ => Self::CreatedAt,
        }
    }
}

/// Sort direction, defaulting to newest-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// The SQL keyword this direction maps to.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Parse from a query-string value, falling back to the default.
    #[must_use]
    pub fn parse_or_default(s: Option<&str>) -> Self {
        match s {
            Some(v) if v.eq_ignore_ascii_case("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }
}

/// Filters for the public catalog listing.
#[derive(Debug, Default)]
pub struct ProductFilter<'a> {
    pub category: Option<&'a str>,
    pub subcategory: Option<&'a str>,
    pub search: Option<&'a str>,
    pub sort: ProductSort,
    pub order: SortOrder,
}

/// Fields for creating a product (admin).
#[derive(Debug)]
pub struct NewProduct<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub category: Option<&'a str>,
    pub subcategory: Option<&'a str>,
    pub stock_quantity: i32,
    pub images: Value,
    pub features: Value,
    pub specifications: Value,
}

/// Optional fields for a partial product update (admin).
#[derive(Debug, Default)]
pub struct ProductChanges<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    pub category: Option<&'a str>,
    pub subcategory: Option<&'a str>,
    pub stock_quantity: Option<i32>,
    pub is_active: Option<bool>,
    pub images: Option<Value>,
    pub features: Option<Value>,
    pub specifications: Option<Value>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product catalog operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active products with filters, sorting, and pagination.
    ///
    /// Returns the page of products plus the total matching count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter<'_>,
        page: ResolvedPage,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let pattern = filter.search.map(|s| format!("%{s}%"));
        let where_clause = "WHERE is_active = TRUE \
               AND ($1::text IS NULL OR category = $1) \
               AND ($2::text IS NULL OR subcategory = $2) \
               AND ($3::text IS NULL OR name ILIKE $3 OR description ILIKE $3)";

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products {where_clause} \
             ORDER BY {} {} \
             LIMIT $4 OFFSET $5",
            filter.sort.column(),
            filter.order.keyword(),
        ))
        .bind(filter.category)
        .bind(filter.subcategory)
        .bind(pattern.as_deref())
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM products {where_clause}"))
                .bind(filter.category)
                .bind(filter.subcategory)
                .bind(pattern.as_deref())
                .fetch_one(self.pool)
                .await?;

        let products = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((products, total))
    }

    /// Get one active product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND is_active = TRUE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Distinct (category, subcategory) pairs over active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<(String, Option<String>)>, RepositoryError> {
        let rows: Vec<(String, Option<String>)> = sqlx::query_as(
            "SELECT DISTINCT category, subcategory FROM products \
             WHERE is_active = TRUE AND category IS NOT NULL \
             ORDER BY category, subcategory",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Search active products, ranking name prefix matches first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(
        &self,
        query: &str,
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let contains = format!("%{query}%");
        let prefix = format!("{query}%");

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = TRUE \
               AND (name ILIKE $1 OR description ILIKE $1 OR category ILIKE $1) \
             ORDER BY \
               CASE WHEN name ILIKE $2 THEN 1 \
                    WHEN name ILIKE $1 THEN 2 \
                    ELSE 3 END, \
               created_at DESC \
             LIMIT $3"
        ))
        .bind(&contains)
        .bind(&prefix)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Newest active products for the featured rail.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = TRUE \
             ORDER BY created_at DESC \
             LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List products for the admin panel (includes inactive rows).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn admin_list(
        &self,
        category: Option<&str>,
        search: Option<&str>,
        page: ResolvedPage,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let pattern = search.map(|s| format!("%{s}%"));
        let where_clause = "WHERE ($1::text IS NULL OR category = $1) \
               AND ($2::text IS NULL OR name ILIKE $2 OR description ILIKE $2)";

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products {where_clause} \
             ORDER BY created_at DESC \
             LIMIT $3 OFFSET $4"
        ))
        .bind(category)
        .bind(pattern.as_deref())
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM products {where_clause}"))
                .bind(category)
                .bind(pattern.as_deref())
                .fetch_one(self.pool)
                .await?;

        let products = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((products, total))
    }

    /// Create a product (admin).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, product: NewProduct<'_>) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products ( \
                name, description, price, original_price, category, subcategory, \
                stock_quantity, images, features, specifications \
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(product.name)
        .bind(product.description)
        .bind(product.price)
        .bind(product.original_price)
        .bind(product.category)
        .bind(product.subcategory)
        .bind(product.stock_quantity)
        .bind(product.images)
        .bind(product.features)
        .bind(product.specifications)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Partially update a product (admin).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn update(
        &self,
        id: ProductId,
        changes: ProductChanges<'_>,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products SET \
                name = COALESCE($1, name), \
                description = COALESCE($2, description), \
                price = COALESCE($3, price), \
                original_price = COALESCE($4, original_price), \
                category = COALESCE($5, category), \
                subcategory = COALESCE($6, subcategory), \
                stock_quantity = COALESCE($7, stock_quantity), \
                is_active = COALESCE($8, is_active), \
                images = COALESCE($9, images), \
                features = COALESCE($10, features), \
                specifications = COALESCE($11, specifications), \
                updated_at = NOW() \
             WHERE id = $12 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.price)
        .bind(changes.original_price)
        .bind(changes.category)
        .bind(changes.subcategory)
        .bind(changes.stock_quantity)
        .bind(changes.is_active)
        .bind(changes.images)
        .bind(changes.features)
        .bind(changes.specifications)
        .bind(id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Delete a product (admin).
    ///
    /// Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_whitelist() {
        assert_eq!(ProductSort::parse_or_default(Some("price")).column(), "price");
        assert_eq!(ProductSort::parse_or_default(Some("name")).column(), "name");
        // Anything outside the whitelist falls back; raw input never reaches SQL
        assert_eq!(
            ProductSort::parse_or_default(Some("price; DROP TABLE products")).column(),
            "created_at"
        );
        assert_eq!(ProductSort::parse_or_default(None).column(), "created_at");
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::parse_or_default(Some("asc")).keyword(), "ASC");
        assert_eq!(SortOrder::parse_or_default(Some("ASC")).keyword(), "ASC");
        assert_eq!(SortOrder::parse_or_default(Some("desc")).keyword(), "DESC");
        assert_eq!(SortOrder::parse_or_default(Some("sideways")).keyword(), "DESC");
        assert_eq!(SortOrder::parse_or_default(None).keyword(), "DESC");
    }
}
