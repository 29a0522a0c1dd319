//! Payment route handlers.
//!
//! The create/verify pair implements the payment round-trip: a gateway
//! intent backed by a pending payment row, then a signature-checked,
//! gateway-confirmed flip of payment and order status. Refunds are
//! administrator-only.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::json;

use orchard_core::{CurrencyCode, OrderId, PageQuery, Pagination, PaymentStatus, Price};

use crate::db::payments::{PaymentError, PaymentHistoryEntry};
use crate::db::{OrderRepository, PaymentRepository};
use crate::error::{AppError, Result};
use crate::gateway::signature_matches;
use crate::middleware::{RequireAdmin, RequireUser};
use crate::models::order::Order;
use crate::models::payment::Payment;
use crate::state::AppState;

/// Default page size for payment history.
const HISTORY_PAGE_SIZE: i64 = 10;

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub order_id: OrderId,
    pub amount: Decimal,
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub message: String,
    pub payment: CreatedPaymentBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPaymentBody {
    pub id: orchard_core::PaymentId,
    pub gateway_order_id: String,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    /// Public key id the client SDK needs to open the gateway checkout.
    pub key_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub order_id: OrderId,
    pub payment_id: String,
    pub signature: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    pub message: String,
    pub payment: VerifiedPaymentBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedPaymentBody {
    pub id: String,
    pub status: PaymentStatus,
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResponse {
    pub order: OrderStatusBody,
    pub payment: Option<Payment>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusBody {
    pub id: OrderId,
    pub order_number: String,
    pub status: orchard_core::OrderStatus,
    pub total_amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub payments: Vec<PaymentHistoryEntry>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    pub amount: Option<Decimal>,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RefundResponse {
    pub message: String,
    pub refund: RefundBody,
}

#[derive(Debug, Serialize)]
pub struct RefundBody {
    pub id: String,
    pub amount: Option<Decimal>,
    pub status: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Create a gateway payment intent for an order.
///
/// POST /api/payments/create-order
///
/// # Errors
///
/// Returns 404 for a missing/unowned order, 409 when the order is cancelled
/// or already paid, 502 for gateway failures.
pub async fn create_order(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<Json<CreatePaymentResponse>> {
    let order = owned_order(&state, req.order_id, current.user.id).await?;

    if order.status == orchard_core::OrderStatus::Cancelled {
        return Err(AppError::Payment(PaymentError::OrderCancelled));
    }

    let payments = PaymentRepository::new(state.pool());
    if payments.has_paid_payment(order.id).await? {
        return Err(AppError::Payment(PaymentError::AlreadyPaid));
    }

    let currency = match req.currency.as_deref() {
        Some(code) => code
            .parse::<CurrencyCode>()
            .map_err(AppError::BadRequest)?,
        None => CurrencyCode::INR,
    };

    let amount_minor = Price::new(req.amount, currency)
        .minor_units()
        .filter(|minor| *minor > 0)
        .ok_or(AppError::Payment(PaymentError::InvalidAmount))?;

    let notes = json!({
        "order_id": order.id,
        "user_id": current.user.id,
    });

    let (gateway_order, snapshot) = state
        .gateway()
        .create_order(amount_minor, currency.code(), &order.order_number, notes)
        .await
        .map_err(PaymentError::from)
        .map_err(AppError::Payment)?;

    let payment = payments
        .create_pending(order.id, req.amount, currency, &gateway_order.id, snapshot)
        .await?;

    Ok(Json(CreatePaymentResponse {
        message: "Payment order created".to_string(),
        payment: CreatedPaymentBody {
            id: payment.id,
            gateway_order_id: gateway_order.id,
            amount: req.amount,
            currency,
            key_id: state.config().gateway.key_id.clone(),
        },
    }))
}

/// Verify a gateway payment callback and flip payment + order status.
///
/// POST /api/payments/verify
///
/// The signature is recomputed as HMAC-SHA256 over
/// `"{orderId}|{paymentId}"`; the payment's captured state is then
/// confirmed with the gateway directly, never trusted from the callback.
/// The status flip is one transaction guarded by the pending predicate.
///
/// # Errors
///
/// Returns 400 for a signature mismatch, 409 when the gateway does not
/// report the payment captured, 404 for a missing order.
pub async fn verify(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Json(req): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>> {
    let order = owned_order(&state, req.order_id, current.user.id).await?;

    let secret = state.config().gateway.key_secret.expose_secret();
    if !signature_matches(
        secret.as_bytes(),
        &order.id.to_string(),
        &req.payment_id,
        &req.signature,
    ) {
        return Err(AppError::Payment(PaymentError::InvalidSignature));
    }

    let (gateway_payment, snapshot) = state
        .gateway()
        .fetch_payment(&req.payment_id)
        .await
        .map_err(PaymentError::from)
        .map_err(AppError::Payment)?;

    if !gateway_payment.status.is_captured() {
        return Err(AppError::Payment(PaymentError::NotCaptured));
    }

    let amount = Decimal::from(gateway_payment.amount) / Decimal::from(100);

    PaymentRepository::new(state.pool())
        .mark_paid(order.id, &req.payment_id, snapshot)
        .await?;

    Ok(Json(VerifyPaymentResponse {
        message: "Payment verified successfully".to_string(),
        payment: VerifiedPaymentBody {
            id: req.payment_id,
            status: PaymentStatus::Paid,
            amount,
            currency: gateway_payment.currency,
        },
    }))
}

/// Payment status for one of the caller's orders.
///
/// GET /api/payments/status/{orderId}
///
/// # Errors
///
/// Returns 404 for a missing/unowned order.
pub async fn status(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<PaymentStatusResponse>> {
    let order = owned_order(&state, order_id, current.user.id).await?;

    let payment = PaymentRepository::new(state.pool())
        .latest_for_order(order.id)
        .await?;

    Ok(Json(PaymentStatusResponse {
        order: OrderStatusBody {
            id: order.id,
            order_number: order.order_number,
            status: order.status,
            total_amount: order.total_amount,
        },
        payment,
    }))
}

/// The caller's payment history, newest first.
///
/// GET /api/payments/history
///
/// # Errors
///
/// Returns 500 for database failures.
pub async fn history(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>> {
    let page = PageQuery {
        limit: query.limit,
        page: query.page,
    }
    .resolve(HISTORY_PAGE_SIZE);

    let (payments, total) = PaymentRepository::new(state.pool())
        .history_for_user(current.user.id, page)
        .await?;

    Ok(Json(HistoryResponse {
        payments,
        pagination: Pagination::new(page, total),
    }))
}

/// Refund a captured payment, fully or partially (administrator only).
///
/// POST /api/payments/refund/{paymentId}
///
/// A full refund (no amount, or amount covering the whole payment) also
/// cancels the order; a partial refund flips the payment to
/// `partially_refunded` and leaves the order untouched.
///
/// # Errors
///
/// Returns 404 when no paid payment matches, 502 for gateway failures.
pub async fn refund(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(payment_id): Path<String>,
    Json(req): Json<RefundRequest>,
) -> Result<Json<RefundResponse>> {
    let payments = PaymentRepository::new(state.pool());

    let payment = payments
        .get_paid_by_transaction(&payment_id)
        .await?
        .ok_or(AppError::Payment(PaymentError::PaymentNotFound))?;

    let full_refund = req.amount.is_none_or(|amount| amount >= payment.amount);

    let refund_minor = match req.amount {
        Some(amount) if !full_refund => Some(
            Price::new(amount, payment.currency)
                .minor_units()
                .filter(|minor| *minor > 0)
                .ok_or(AppError::Payment(PaymentError::InvalidAmount))?,
        ),
        _ => None,
    };

    let (gateway_refund, snapshot) = state
        .gateway()
        .refund_payment(&payment_id, refund_minor, req.reason.as_deref())
        .await
        .map_err(PaymentError::from)
        .map_err(AppError::Payment)?;

    payments
        .mark_refunded(
            payment.id,
            payment.order_id,
            full_refund,
            snapshot,
            admin.current.user.id,
        )
        .await?;

    let refunded_amount = gateway_refund
        .amount
        .map(|minor| Decimal::from(minor) / Decimal::from(100));

    Ok(Json(RefundResponse {
        message: "Refund processed successfully".to_string(),
        refund: RefundBody {
            id: gateway_refund.id,
            amount: refunded_amount,
            status: gateway_refund.status,
        },
    }))
}

// =============================================================================
// Helpers
// =============================================================================

/// Load an order and require the caller to own it.
async fn owned_order(
    state: &AppState,
    order_id: OrderId,
    user_id: orchard_core::UserId,
) -> Result<Order> {
    OrderRepository::new(state.pool())
        .get_for_user(order_id, user_id)
        .await?
        .ok_or(AppError::Payment(PaymentError::OrderNotFound))
}
