//! Order route handlers.
//!
//! Creation and cancellation delegate to the transactional sequences in
//! [`OrderRepository`]; reads compose the order, item, tracking, and latest
//! payment queries the way the client consumes them.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orchard_core::{OrderId, OrderStatus, PageQuery, Pagination, ProductId};

use crate::db::orders::{CartLine, NewOrder, OrderSummary, TrackedOrder};
use crate::db::{OrderRepository, PaymentRepository};
use crate::error::{AppError, Result};
use crate::middleware::{OptionalUser, RequireUser};
use crate::models::order::{AddressSnapshot, Order, OrderItem, TrackingEvent};
use crate::models::payment::Payment;
use crate::state::AppState;

/// Default page size for order listings.
const ORDERS_PAGE_SIZE: i64 = 10;

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: AddressSnapshot,
    pub billing_address: Option<AddressSnapshot>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Creation response: the slice of the order the client needs immediately.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrderResponse {
    pub message: String,
    pub order: CreatedOrderBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrderBody {
    pub id: OrderId,
    pub order_number: String,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub tracking_number: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct MyOrdersQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderSummary>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct OrderDetailResponse {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub tracking: Vec<TrackingEvent>,
    pub payment: Option<Payment>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub order: TrackedOrder,
    pub tracking: Vec<TrackingEvent>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Create an order from the caller's cart.
///
/// POST /api/orders
///
/// The whole sequence (stock decrements, order insert, item inserts,
/// tracking insert) is one transaction; any failure leaves stock and order
/// tables exactly as before the call.
///
/// # Errors
///
/// Returns 400 for an empty cart or bad quantities, 404 for a missing
/// product, 409 for insufficient stock.
pub async fn create(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreatedOrderResponse>)> {
    let items = req
        .items
        .iter()
        .map(|item| CartLine {
            product_id: item.product_id,
            quantity: item.quantity,
        })
        .collect();

    let created = OrderRepository::new(state.pool())
        .create(NewOrder {
            user_id: current.user.id,
            items,
            shipping_address: req.shipping_address,
            billing_address: req.billing_address,
            notes: req.notes,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedOrderResponse {
            message: "Order created successfully".to_string(),
            order: CreatedOrderBody {
                id: created.order.id,
                order_number: created.order.order_number,
                total_amount: created.order.total_amount,
                status: created.order.status,
                tracking_number: created.tracking_number,
                created_at: created.order.created_at,
            },
        }),
    ))
}

/// List the caller's orders.
///
/// GET /api/orders/my-orders
///
/// # Errors
///
/// Returns 400 for an unknown status filter.
pub async fn my_orders(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Query(query): Query<MyOrdersQuery>,
) -> Result<Json<OrderListResponse>> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()
        .map_err(AppError::BadRequest)?;

    let page = PageQuery {
        limit: query.limit,
        page: query.page,
    }
    .resolve(ORDERS_PAGE_SIZE);

    let (orders, total) = OrderRepository::new(state.pool())
        .list_for_user(current.user.id, status, page)
        .await?;

    Ok(Json(OrderListResponse {
        orders,
        pagination: Pagination::new(page, total),
    }))
}

/// Get one of the caller's orders with items, tracking, and latest payment.
///
/// GET /api/orders/{id}
///
/// # Errors
///
/// Returns 404 when the order is missing or not owned by the caller.
pub async fn show(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetailResponse>> {
    let orders = OrderRepository::new(state.pool());

    let order = orders
        .get_for_user(id, current.user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

    let items = orders.items(id).await?;
    let tracking = orders.tracking(id).await?;
    let payment = PaymentRepository::new(state.pool())
        .latest_for_order(id)
        .await?;

    Ok(Json(OrderDetailResponse {
        order,
        items,
        tracking,
        payment,
    }))
}

/// Cancel one of the caller's pending orders.
///
/// PUT /api/orders/{id}/cancel
///
/// # Errors
///
/// Returns 404 for a missing order, 409 when the order is past `pending`.
pub async fn cancel(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Path(id): Path<OrderId>,
) -> Result<Json<MessageResponse>> {
    OrderRepository::new(state.pool())
        .cancel(id, current.user.id)
        .await?;

    Ok(Json(MessageResponse {
        message: "Order cancelled successfully".to_string(),
    }))
}

/// Track an order by number, as a guest (with email) or as the owner.
///
/// GET /api/orders/track/{orderNumber}
///
/// # Errors
///
/// Returns 400 when a guest omits the email, 404 for no match.
pub async fn track(
    State(state): State<AppState>,
    OptionalUser(current): OptionalUser,
    Path(order_number): Path<String>,
    Query(query): Query<TrackQuery>,
) -> Result<Json<TrackResponse>> {
    // Guests must supply the order's email; owners are matched by their own.
    let email = match (&query.email, &current) {
        (Some(email), _) => email.clone(),
        (None, Some(current)) => current.user.email.as_str().to_owned(),
        (None, None) => {
            return Err(AppError::BadRequest(
                "Email is required for guest tracking.".to_string(),
            ));
        }
    };

    let orders = OrderRepository::new(state.pool());
    let (order_id, order) = orders
        .track_by_number(&order_number, Some(&email))
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

    let tracking = orders.tracking(order_id).await?;

    Ok(Json(TrackResponse { order, tracking }))
}
