//! Payment repository: gateway payment attempts and the verify/refund flips.
//!
//! The verify flip is guarded by the `payment_status = 'pending'` predicate:
//! a second verification of the same order updates zero rows and performs no
//! further writes, so the order transition and tracking append happen at most
//! once per payment.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use orchard_core::{CurrencyCode, OrderId, OrderStatus, PaymentId, PaymentStatus, ResolvedPage, UserId};

use super::RepositoryError;
use super::orders::insert_tracking;
use crate::gateway::GatewayError;
use crate::models::payment::Payment;

/// Errors from the payment round-trip sequences.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The order is missing or not owned by the caller.
    #[error("order not found")]
    OrderNotFound,

    /// Payments cannot be taken against a cancelled order.
    #[error("cannot process payment for a cancelled order")]
    OrderCancelled,

    /// A payment for this order is already completed.
    #[error("payment already completed for this order")]
    AlreadyPaid,

    /// The callback signature did not match.
    #[error("invalid payment signature")]
    InvalidSignature,

    /// The gateway does not report the payment as captured.
    #[error("payment not captured")]
    NotCaptured,

    /// No matching payment row (or not eligible for the operation).
    #[error("payment not found or not eligible")]
    PaymentNotFound,

    /// The amount could not be converted to minor units.
    #[error("invalid payment amount")]
    InvalidAmount,

    /// Payment gateway call failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Underlying repository failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for PaymentError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    order_id: Uuid,
    amount: Decimal,
    currency: String,
    payment_method: String,
    payment_status: String,
    transaction_id: Option<String>,
    gateway_response: Option<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = RepositoryError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let status: PaymentStatus = row.payment_status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid payment status in database: {e}"))
        })?;
        let currency: CurrencyCode = row.currency.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid currency in database: {e}"))
        })?;

        Ok(Self {
            id: PaymentId::new(row.id),
            order_id: OrderId::new(row.order_id),
            amount: row.amount,
            currency,
            payment_method: row.payment_method,
            status,
            transaction_id: row.transaction_id,
            gateway_response: row.gateway_response,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const PAYMENT_COLUMNS: &str = "id, order_id, amount, currency, payment_method, payment_status, \
     transaction_id, gateway_response, created_at, updated_at";

/// Payment history entry joined with its order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHistoryEntry {
    #[serde(flatten)]
    pub payment: Payment,
    pub order_number: String,
    pub order_status: OrderStatus,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for payment operations.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    /// Create a new payment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Whether the order already has a completed payment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_paid_payment(&self, order_id: OrderId) -> Result<bool, RepositoryError> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM payments WHERE order_id = $1 AND payment_status = 'paid'",
        )
        .bind(order_id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.is_some())
    }

    /// Persist a pending payment row for a freshly created gateway intent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_pending(
        &self,
        order_id: OrderId,
        amount: Decimal,
        currency: CurrencyCode,
        gateway_order_id: &str,
        gateway_response: Value,
    ) -> Result<Payment, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "INSERT INTO payments ( \
                order_id, amount, currency, payment_method, payment_status, \
                transaction_id, gateway_response \
             ) VALUES ($1, $2, $3, 'gateway', 'pending', $4, $5) \
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(order_id.as_uuid())
        .bind(amount)
        .bind(currency.code())
        .bind(gateway_order_id)
        .bind(gateway_response)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Flip the pending payment for an order to paid and move the order to
    /// processing, appending a tracking row; one transaction.
    ///
    /// Returns `true` if the flip was applied, `false` if no pending payment
    /// row matched (a previous verification already completed it); in the
    /// latter case nothing else is written.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Repository` for database failures.
    pub async fn mark_paid(
        &self,
        order_id: OrderId,
        transaction_id: &str,
        gateway_response: Value,
    ) -> Result<bool, PaymentError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE payments SET \
                payment_status = 'paid', \
                transaction_id = $1, \
                gateway_response = $2, \
                updated_at = NOW() \
             WHERE order_id = $3 AND payment_status = 'pending'",
        )
        .bind(transaction_id)
        .bind(gateway_response)
        .bind(order_id.as_uuid())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            // Already verified; leave payment, order, and tracking untouched.
            return Ok(false);
        }

        sqlx::query("UPDATE orders SET status = 'processing', updated_at = NOW() WHERE id = $1")
            .bind(order_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        insert_tracking(
            &mut tx,
            order_id,
            OrderStatus::Processing,
            "Payment received, order processing started",
            None,
            None,
            None,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(order_id = %order_id, transaction_id, "payment verified");

        Ok(true)
    }

    /// Find a paid payment by its gateway transaction id (refund eligibility).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_paid_by_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments \
             WHERE transaction_id = $1 AND payment_status = 'paid'"
        ))
        .bind(transaction_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Record a refund against a paid payment.
    ///
    /// Full refunds also cancel the order and append a tracking row, in the
    /// same transaction. Partial refunds flip the payment to
    /// `partially_refunded` and deliberately leave the order untouched.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Repository` for database failures.
    pub async fn mark_refunded(
        &self,
        payment_id: PaymentId,
        order_id: OrderId,
        full_refund: bool,
        gateway_response: Value,
        actor: UserId,
    ) -> Result<(), PaymentError> {
        let mut tx = self.pool.begin().await?;

        let new_status = if full_refund {
            PaymentStatus::Refunded
        } else {
            PaymentStatus::PartiallyRefunded
        };

        sqlx::query(
            "UPDATE payments SET payment_status = $1, gateway_response = $2, \
             updated_at = NOW() WHERE id = $3",
        )
        .bind(new_status.to_string())
        .bind(gateway_response)
        .bind(payment_id.as_uuid())
        .execute(&mut *tx)
        .await?;

        if full_refund {
            sqlx::query(
                "UPDATE orders SET status = 'cancelled', updated_at = NOW() WHERE id = $1",
            )
            .bind(order_id.as_uuid())
            .execute(&mut *tx)
            .await?;

            insert_tracking(
                &mut tx,
                order_id,
                OrderStatus::Cancelled,
                "Order cancelled due to refund",
                None,
                None,
                Some(actor),
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            payment_id = %payment_id,
            order_id = %order_id,
            full_refund,
            "refund recorded"
        );

        Ok(())
    }

    /// The latest payment attempt for an order, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments \
             WHERE order_id = $1 \
             ORDER BY created_at DESC \
             LIMIT 1"
        ))
        .bind(order_id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Paginated payment history for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn history_for_user(
        &self,
        user_id: UserId,
        page: ResolvedPage,
    ) -> Result<(Vec<PaymentHistoryEntry>, i64), RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct HistoryRow {
            #[sqlx(flatten)]
            payment: PaymentRow,
            order_number: String,
            order_status: String,
        }

        let rows = sqlx::query_as::<_, HistoryRow>(
            "SELECT p.id, p.order_id, p.amount, p.currency, p.payment_method, \
                    p.payment_status, p.transaction_id, p.gateway_response, \
                    p.created_at, p.updated_at, \
                    o.order_number, o.status AS order_status \
             FROM payments p \
             JOIN orders o ON p.order_id = o.id \
             WHERE o.user_id = $1 \
             ORDER BY p.created_at DESC \
             LIMIT $2 OFFSET $3",
        )
        .bind(user_id.as_uuid())
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM payments p \
             JOIN orders o ON p.order_id = o.id \
             WHERE o.user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_one(self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for r in rows {
            let order_status: OrderStatus = r.order_status.parse().map_err(|e: String| {
                RepositoryError::DataCorruption(format!("invalid order status: {e}"))
            })?;
            entries.push(PaymentHistoryEntry {
                payment: r.payment.try_into()?,
                order_number: r.order_number,
                order_status,
            });
        }

        Ok((entries, total))
    }
}
