//! Order repository: the order transaction sequences.
//!
//! Order creation, cancellation, and admin status transitions each run as a
//! single database transaction; any failure rolls back every write performed
//! so far. Stock is guarded by conditional updates (`stock_quantity >= $n`),
//! never by a separate read-then-write check.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

use orchard_core::{
    CurrencyCode, OrderId, OrderItemId, OrderStatus, PaymentStatus, ProductId, ResolvedPage,
    TrackingEventId, UserId,
};

use super::RepositoryError;
use crate::models::order::{AddressSnapshot, Order, OrderItem, TrackingEvent};
use crate::services::reference;

/// Errors from the order transaction sequences.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The cart was empty.
    #[error("order must contain at least one item")]
    EmptyCart,

    /// A line item had a non-positive quantity.
    #[error("item quantities must be at least 1")]
    InvalidQuantity,

    /// A referenced product is missing or inactive.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// Requested quantity exceeds current stock.
    #[error("insufficient stock for {name}")]
    InsufficientStock {
        /// Product name, for the client-facing message.
        name: String,
    },

    /// The order is missing or not owned by the caller.
    #[error("order not found")]
    OrderNotFound,

    /// The order cannot be cancelled from its current status.
    #[error("order cannot be cancelled from status '{0}'")]
    NotCancellable(OrderStatus),

    /// Underlying repository failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for OrderError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

// =============================================================================
// Inputs
// =============================================================================

/// One requested cart line.
#[derive(Debug, Clone, Copy)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Everything needed to create an order.
#[derive(Debug)]
pub struct NewOrder {
    pub user_id: UserId,
    pub items: Vec<CartLine>,
    pub shipping_address: AddressSnapshot,
    /// Defaults to the shipping address when absent.
    pub billing_address: Option<AddressSnapshot>,
    pub notes: Option<String>,
}

/// A created order with its line items and initial tracking number.
#[derive(Debug)]
pub struct CreatedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub tracking_number: String,
}

/// Admin status transition input.
#[derive(Debug)]
pub struct StatusChange<'a> {
    pub status: OrderStatus,
    pub description: Option<&'a str>,
    pub location: Option<&'a str>,
    pub tracking_number: Option<&'a str>,
    pub updated_by: UserId,
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    user_id: Uuid,
    total_amount: Decimal,
    currency: String,
    status: String,
    shipping_address: Value,
    billing_address: Value,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row.status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;
        let currency: CurrencyCode = row.currency.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid currency in database: {e}"))
        })?;
        let shipping_address: AddressSnapshot = serde_json::from_value(row.shipping_address)
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid shipping address: {e}"))
            })?;
        let billing_address: AddressSnapshot = serde_json::from_value(row.billing_address)
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid billing address: {e}"))
            })?;

        Ok(Self {
            id: OrderId::new(row.id),
            order_number: row.order_number,
            user_id: UserId::new(row.user_id),
            total_amount: row.total_amount,
            currency,
            status,
            shipping_address,
            billing_address,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    product_name: String,
    product_price: Decimal,
    quantity: i32,
    total_price: Decimal,
    created_at: DateTime<Utc>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            product_price: row.product_price,
            quantity: row.quantity,
            total_price: row.total_price,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TrackingRow {
    id: Uuid,
    order_id: Uuid,
    status: String,
    description: String,
    location: Option<String>,
    tracking_number: Option<String>,
    updated_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TrackingRow> for TrackingEvent {
    type Error = RepositoryError;

    fn try_from(row: TrackingRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row.status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid tracking status in database: {e}"))
        })?;

        Ok(Self {
            id: TrackingEventId::new(row.id),
            order_id: OrderId::new(row.order_id),
            status,
            description: row.description,
            location: row.location,
            tracking_number: row.tracking_number,
            updated_by: row.updated_by.map(UserId::new),
            created_at: row.created_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, order_number, user_id, total_amount, currency, status, \
     shipping_address, billing_address, notes, created_at, updated_at";

const TRACKING_COLUMNS: &str =
    "id, order_id, status, description, location, tracking_number, updated_by, created_at";

// =============================================================================
// List / summary view types
// =============================================================================

/// Customer-facing order list entry with the latest tracking info.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: OrderId,
    pub order_number: String,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub currency: CurrencyCode,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub latest_status: Option<OrderStatus>,
    pub tracking_number: Option<String>,
}

/// Admin order list entry with customer and latest payment status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderSummary {
    pub id: OrderId,
    pub order_number: String,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub currency: CurrencyCode,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub payment_status: Option<PaymentStatus>,
}

/// Guest/owner tracking lookup result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedOrder {
    pub order_number: String,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub currency: CurrencyCode,
    pub customer_name: String,
    pub customer_email: String,
    pub created_at: DateTime<Utc>,
}

/// Dashboard entry for the most recent orders.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrder {
    pub id: OrderId,
    pub order_number: String,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an order from a validated cart.
    ///
    /// Runs as one transaction: per line, the product is loaded (must exist
    /// and be active) and its stock decremented with a conditional update;
    /// then the order header, item snapshots, and the initial tracking row
    /// are inserted. The total is computed from the products' current prices,
    /// never from client-supplied prices. Any failure rolls back everything.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::EmptyCart` / `InvalidQuantity` for bad input,
    /// `ProductNotFound` / `InsufficientStock` for per-line failures, and
    /// `Repository` for database errors.
    pub async fn create(&self, new_order: NewOrder) -> Result<CreatedOrder, OrderError> {
        if new_order.items.is_empty() {
            return Err(OrderError::EmptyCart);
        }
        if new_order.items.iter().any(|line| line.quantity < 1) {
            return Err(OrderError::InvalidQuantity);
        }

        let mut tx = self.pool.begin().await?;

        let mut total_amount = Decimal::ZERO;
        let mut snapshots: Vec<(ProductId, String, Decimal, i32, Decimal)> =
            Vec::with_capacity(new_order.items.len());

        for line in &new_order.items {
            let product: Option<(String, Decimal)> = sqlx::query_as(
                "SELECT name, price FROM products WHERE id = $1 AND is_active = TRUE",
            )
            .bind(line.product_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?;

            let Some((name, price)) = product else {
                return Err(OrderError::ProductNotFound(line.product_id));
            };

            // The stock guard: zero rows affected means the remaining stock
            // is below the requested quantity, even under concurrent orders.
            let decremented = sqlx::query(
                "UPDATE products SET stock_quantity = stock_quantity - $1 \
                 WHERE id = $2 AND stock_quantity >= $1",
            )
            .bind(line.quantity)
            .bind(line.product_id.as_uuid())
            .execute(&mut *tx)
            .await?;

            if decremented.rows_affected() == 0 {
                return Err(OrderError::InsufficientStock { name });
            }

            let line_total = price * Decimal::from(line.quantity);
            total_amount += line_total;
            snapshots.push((line.product_id, name, price, line.quantity, line_total));
        }

        let order_number = reference::generate_order_number();
        let billing = new_order
            .billing_address
            .clone()
            .unwrap_or_else(|| new_order.shipping_address.clone());

        let shipping_json = serde_json::to_value(&new_order.shipping_address).map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize address: {e}"))
        })?;
        let billing_json = serde_json::to_value(&billing).map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize address: {e}"))
        })?;

        let order_row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders ( \
                order_number, user_id, total_amount, currency, shipping_address, \
                billing_address, notes, status \
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending') \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(&order_number)
        .bind(new_order.user_id.as_uuid())
        .bind(total_amount)
        .bind(CurrencyCode::INR.code())
        .bind(shipping_json)
        .bind(billing_json)
        .bind(new_order.notes.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return OrderError::Repository(RepositoryError::Conflict(
                    "order number collision, retry the request".to_owned(),
                ));
            }
            OrderError::from(e)
        })?;

        let order: Order = order_row.try_into()?;

        let mut items = Vec::with_capacity(snapshots.len());
        for (product_id, name, price, quantity, line_total) in snapshots {
            let item_row = sqlx::query_as::<_, OrderItemRow>(
                "INSERT INTO order_items ( \
                    order_id, product_id, product_name, product_price, quantity, total_price \
                 ) VALUES ($1, $2, $3, $4, $5, $6) \
                 RETURNING id, order_id, product_id, product_name, product_price, quantity, \
                           total_price, created_at",
            )
            .bind(order.id.as_uuid())
            .bind(product_id.as_uuid())
            .bind(&name)
            .bind(price)
            .bind(quantity)
            .bind(line_total)
            .fetch_one(&mut *tx)
            .await?;

            items.push(OrderItem::from(item_row));
        }

        let tracking_number = reference::generate_tracking_number();
        insert_tracking(
            &mut tx,
            order.id,
            OrderStatus::Pending,
            "Order placed successfully",
            None,
            Some(&tracking_number),
            None,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total_amount,
            "order created"
        );

        Ok(CreatedOrder {
            order,
            items,
            tracking_number,
        })
    }

    /// Cancel a pending order owned by the user.
    ///
    /// Runs as one transaction: the status flip is a conditional update on
    /// `status = 'pending'`, stock is restored per line item, and a tracking
    /// row is appended. Zero rows affected means the order left `pending`
    /// in the meantime, which surfaces as `NotCancellable`.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OrderNotFound` if the order is missing or not
    /// owned by the caller, `NotCancellable` for non-pending orders.
    pub async fn cancel(&self, order_id: OrderId, user_id: UserId) -> Result<(), OrderError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(String,)> =
            sqlx::query_as("SELECT status FROM orders WHERE id = $1 AND user_id = $2")
                .bind(order_id.as_uuid())
                .bind(user_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;

        let Some((status_str,)) = current else {
            return Err(OrderError::OrderNotFound);
        };
        let status: OrderStatus = status_str.parse().map_err(|e: String| {
            OrderError::Repository(RepositoryError::DataCorruption(e))
        })?;

        if !status.can_cancel() {
            return Err(OrderError::NotCancellable(status));
        }

        let updated = sqlx::query(
            "UPDATE orders SET status = 'cancelled', updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 AND status = 'pending'",
        )
        .bind(order_id.as_uuid())
        .bind(user_id.as_uuid())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            // Lost a race with a concurrent transition
            return Err(OrderError::NotCancellable(status));
        }

        let items: Vec<(Uuid, i32)> =
            sqlx::query_as("SELECT product_id, quantity FROM order_items WHERE order_id = $1")
                .bind(order_id.as_uuid())
                .fetch_all(&mut *tx)
                .await?;

        for (product_id, quantity) in items {
            sqlx::query(
                "UPDATE products SET stock_quantity = stock_quantity + $1 WHERE id = $2",
            )
            .bind(quantity)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        }

        insert_tracking(
            &mut tx,
            order_id,
            OrderStatus::Cancelled,
            "Order cancelled by customer",
            None,
            None,
            Some(user_id),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(order_id = %order_id, "order cancelled by customer");

        Ok(())
    }

    /// List a user's orders with the latest tracking info.
    ///
    /// Returns the page of summaries plus the total matching count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        status: Option<OrderStatus>,
        page: ResolvedPage,
    ) -> Result<(Vec<OrderSummary>, i64), RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct SummaryRow {
            id: Uuid,
            order_number: String,
            status: String,
            total_amount: Decimal,
            currency: String,
            created_at: DateTime<Utc>,
            updated_at: DateTime<Utc>,
            latest_status: Option<String>,
            tracking_number: Option<String>,
        }

        let rows = sqlx::query_as::<_, SummaryRow>(
            "SELECT o.id, o.order_number, o.status, o.total_amount, o.currency, \
                    o.created_at, o.updated_at, \
                    (SELECT status FROM order_tracking WHERE order_id = o.id \
                     ORDER BY created_at DESC LIMIT 1) AS latest_status, \
                    (SELECT tracking_number FROM order_tracking WHERE order_id = o.id \
                     AND tracking_number IS NOT NULL \
                     ORDER BY created_at DESC LIMIT 1) AS tracking_number \
             FROM orders o \
             WHERE o.user_id = $1 AND ($2::text IS NULL OR o.status = $2) \
             ORDER BY o.created_at DESC \
             LIMIT $3 OFFSET $4",
        )
        .bind(user_id.as_uuid())
        .bind(status.map(|s| s.to_string()))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM orders o \
             WHERE o.user_id = $1 AND ($2::text IS NULL OR o.status = $2)",
        )
        .bind(user_id.as_uuid())
        .bind(status.map(|s| s.to_string()))
        .fetch_one(self.pool)
        .await?;

        let mut summaries = Vec::with_capacity(rows.len());
        for r in rows {
            let status: OrderStatus = r.status.parse().map_err(|e: String| {
                RepositoryError::DataCorruption(format!("invalid order status: {e}"))
            })?;
            let currency: CurrencyCode = r.currency.parse().map_err(|e: String| {
                RepositoryError::DataCorruption(format!("invalid currency: {e}"))
            })?;
            let latest_status = r
                .latest_status
                .as_deref()
                .map(str::parse)
                .transpose()
                .map_err(|e: String| {
                    RepositoryError::DataCorruption(format!("invalid tracking status: {e}"))
                })?;

            summaries.push(OrderSummary {
                id: OrderId::new(r.id),
                order_number: r.order_number,
                status,
                total_amount: r.total_amount,
                currency,
                created_at: r.created_at,
                updated_at: r.updated_at,
                latest_status,
                tracking_number: r.tracking_number,
            });
        }

        Ok((summaries, total))
    }

    /// Get an order owned by the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2"
        ))
        .bind(order_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get an order by id regardless of owner (admin).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(order_id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// All line items for an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            "SELECT id, order_id, product_id, product_name, product_price, quantity, \
                    total_price, created_at \
             FROM order_items WHERE order_id = $1 \
             ORDER BY created_at ASC",
        )
        .bind(order_id.as_uuid())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    /// Tracking history for an order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn tracking(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<TrackingEvent>, RepositoryError> {
        let rows = sqlx::query_as::<_, TrackingRow>(&format!(
            "SELECT {TRACKING_COLUMNS} FROM order_tracking \
             WHERE order_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(order_id.as_uuid())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Look up an order by its number for guest/owner tracking.
    ///
    /// When `email` is given it must match the owning user; authenticated
    /// owners pass `None` and are matched by the route's ownership rules.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn track_by_number(
        &self,
        order_number: &str,
        email: Option<&str>,
    ) -> Result<Option<(OrderId, TrackedOrder)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct TrackRow {
            id: Uuid,
            order_number: String,
            status: String,
            total_amount: Decimal,
            currency: String,
            created_at: DateTime<Utc>,
            first_name: String,
            last_name: String,
            email: String,
        }

        let row = sqlx::query_as::<_, TrackRow>(
            "SELECT o.id, o.order_number, o.status, o.total_amount, o.currency, o.created_at, \
                    u.first_name, u.last_name, u.email \
             FROM orders o \
             JOIN users u ON o.user_id = u.id \
             WHERE o.order_number = $1 AND ($2::text IS NULL OR u.email = $2)",
        )
        .bind(order_number)
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        let status: OrderStatus = r.status.parse().map_err(|e: String| {
            RepositoryError::DataCorruption(format!("invalid order status: {e}"))
        })?;
        let currency: CurrencyCode = r.currency.parse().map_err(|e: String| {
            RepositoryError::DataCorruption(format!("invalid currency: {e}"))
        })?;

        Ok(Some((
            OrderId::new(r.id),
            TrackedOrder {
                order_number: r.order_number,
                status,
                total_amount: r.total_amount,
                currency,
                customer_name: format!("{} {}", r.first_name, r.last_name),
                customer_email: r.email,
                created_at: r.created_at,
            },
        )))
    }

    /// List orders for the admin panel.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn admin_list(
        &self,
        status: Option<OrderStatus>,
        search: Option<&str>,
        page: ResolvedPage,
    ) -> Result<(Vec<AdminOrderSummary>, i64), RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct AdminRow {
            id: Uuid,
            order_number: String,
            status: String,
            total_amount: Decimal,
            currency: String,
            created_at: DateTime<Utc>,
            updated_at: DateTime<Utc>,
            first_name: String,
            last_name: String,
            email: String,
            payment_status: Option<String>,
        }

        let pattern = search.map(|s| format!("%{s}%"));

        let rows = sqlx::query_as::<_, AdminRow>(
            "SELECT o.id, o.order_number, o.status, o.total_amount, o.currency, \
                    o.created_at, o.updated_at, \
                    u.first_name, u.last_name, u.email, \
                    (SELECT payment_status FROM payments WHERE order_id = o.id \
                     ORDER BY created_at DESC LIMIT 1) AS payment_status \
             FROM orders o \
             JOIN users u ON o.user_id = u.id \
             WHERE ($1::text IS NULL OR o.status = $1) \
               AND ($2::text IS NULL OR o.order_number ILIKE $2 OR u.email ILIKE $2) \
             ORDER BY o.created_at DESC \
             LIMIT $3 OFFSET $4",
        )
        .bind(status.map(|s| s.to_string()))
        .bind(pattern.as_deref())
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM orders o \
             JOIN users u ON o.user_id = u.id \
             WHERE ($1::text IS NULL OR o.status = $1) \
               AND ($2::text IS NULL OR o.order_number ILIKE $2 OR u.email ILIKE $2)",
        )
        .bind(status.map(|s| s.to_string()))
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;

        let mut summaries = Vec::with_capacity(rows.len());
        for r in rows {
            let status: OrderStatus = r.status.parse().map_err(|e: String| {
                RepositoryError::DataCorruption(format!("invalid order status: {e}"))
            })?;
            let currency: CurrencyCode = r.currency.parse().map_err(|e: String| {
                RepositoryError::DataCorruption(format!("invalid currency: {e}"))
            })?;
            let payment_status = r
                .payment_status
                .as_deref()
                .map(str::parse)
                .transpose()
                .map_err(|e: String| {
                    RepositoryError::DataCorruption(format!("invalid payment status: {e}"))
                })?;

            summaries.push(AdminOrderSummary {
                id: OrderId::new(r.id),
                order_number: r.order_number,
                status,
                total_amount: r.total_amount,
                currency,
                created_at: r.created_at,
                updated_at: r.updated_at,
                first_name: r.first_name,
                last_name: r.last_name,
                email: r.email,
                payment_status,
            });
        }

        Ok((summaries, total))
    }

    /// Force an order into a status (admin), appending a tracking row.
    ///
    /// Any transition is allowed here; the customer state machine only
    /// constrains the customer cancellation path.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OrderNotFound` if the order doesn't exist.
    pub async fn set_status(
        &self,
        order_id: OrderId,
        change: StatusChange<'_>,
    ) -> Result<(), OrderError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE orders SET status = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(change.status.to_string())
        .bind(order_id.as_uuid())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(OrderError::OrderNotFound);
        }

        let default_description = format!("Order status updated to {}", change.status);
        insert_tracking(
            &mut tx,
            order_id,
            change.status,
            change.description.unwrap_or(&default_description),
            change.location,
            change.tracking_number,
            Some(change.updated_by),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(order_id = %order_id, status = %change.status, "order status forced");

        Ok(())
    }

    // =========================================================================
    // Dashboard aggregates
    // =========================================================================

    /// Total order count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Total revenue across non-cancelled orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn total_revenue(&self) -> Result<Decimal, RepositoryError> {
        let (sum,): (Decimal,) = sqlx::query_as(
            "SELECT COALESCE(SUM(total_amount), 0) FROM orders WHERE status != 'cancelled'",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(sum)
    }

    /// The most recent orders with customer info.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent(&self, limit: i64) -> Result<Vec<RecentOrder>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct RecentRow {
            id: Uuid,
            order_number: String,
            status: String,
            total_amount: Decimal,
            created_at: DateTime<Utc>,
            first_name: String,
            last_name: String,
            email: String,
        }

        let rows = sqlx::query_as::<_, RecentRow>(
            "SELECT o.id, o.order_number, o.status, o.total_amount, o.created_at, \
                    u.first_name, u.last_name, u.email \
             FROM orders o \
             JOIN users u ON o.user_id = u.id \
             ORDER BY o.created_at DESC \
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        let mut recent = Vec::with_capacity(rows.len());
        for r in rows {
            let status: OrderStatus = r.status.parse().map_err(|e: String| {
                RepositoryError::DataCorruption(format!("invalid order status: {e}"))
            })?;
            recent.push(RecentOrder {
                id: OrderId::new(r.id),
                order_number: r.order_number,
                status,
                total_amount: r.total_amount,
                created_at: r.created_at,
                first_name: r.first_name,
                last_name: r.last_name,
                email: r.email,
            });
        }

        Ok(recent)
    }

    /// Order counts grouped by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn status_distribution(&self) -> Result<Vec<(String, i64)>, RepositoryError> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM orders GROUP BY status")
                .fetch_all(self.pool)
                .await?;
        Ok(rows)
    }
}

/// Append one tracking row inside an open transaction.
pub(crate) async fn insert_tracking(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
    status: OrderStatus,
    description: &str,
    location: Option<&str>,
    tracking_number: Option<&str>,
    updated_by: Option<UserId>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO order_tracking ( \
            order_id, status, description, location, tracking_number, updated_by \
         ) VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(order_id.as_uuid())
    .bind(status.to_string())
    .bind(description)
    .bind(location)
    .bind(tracking_number)
    .bind(updated_by.map(|u| u.as_uuid()))
    .execute(&mut **tx)
    .await?;

    Ok(())
}
