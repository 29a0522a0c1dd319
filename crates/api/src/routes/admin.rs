//! Administrator route handlers.
//!
//! Dashboard aggregates, user management, order management (including
//! forced status transitions), and product CRUD. Every handler requires an
//! `admin_users` role record via [`RequireAdmin`].

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use orchard_core::{OrderId, OrderStatus, PageQuery, Pagination, ProductId, UserId};

use crate::db::orders::{AdminOrderSummary, RecentOrder, StatusChange};
use crate::db::products::{NewProduct, ProductChanges};
use crate::db::{OrderRepository, PaymentRepository, ProductRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::order::{Order, OrderItem, TrackingEvent};
use crate::models::payment::Payment;
use crate::models::product::Product;
use crate::models::user::User;
use crate::state::AppState;

/// Default page size for admin listings.
const ADMIN_PAGE_SIZE: i64 = 20;
/// How many recent orders the dashboard shows.
const RECENT_ORDERS: i64 = 10;

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub stats: DashboardStats,
    pub recent_orders: Vec<RecentOrder>,
    pub status_distribution: BTreeMap<String, i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_orders: i64,
    pub total_revenue: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetUserStatusRequest {
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<AdminOrderSummary>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderDetailResponse {
    pub order: Order,
    pub customer: CustomerBody,
    pub items: Vec<OrderItem>,
    pub tracking: Vec<TrackingEvent>,
    pub payment: Option<Payment>,
}

#[derive(Debug, Serialize)]
pub struct CustomerBody {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetOrderStatusRequest {
    pub status: OrderStatus,
    pub description: Option<String>,
    pub location: Option<String>,
    pub tracking_number: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    #[serde(default)]
    pub stock_quantity: i32,
    pub images: Option<Value>,
    pub features: Option<Value>,
    pub specifications: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub stock_quantity: Option<i32>,
    pub is_active: Option<bool>,
    pub images: Option<Value>,
    pub features: Option<Value>,
    pub specifications: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub message: String,
    pub product: Product,
}

// =============================================================================
// Dashboard
// =============================================================================

/// Store-wide stats, recent orders, and the order status distribution.
///
/// GET /api/admin/dashboard
///
/// # Errors
///
/// Returns 500 for database failures.
pub async fn dashboard(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<DashboardResponse>> {
    let users = UserRepository::new(state.pool());
    let orders = OrderRepository::new(state.pool());

    let total_users = users.count().await?;
    let total_orders = orders.count().await?;
    let total_revenue = orders.total_revenue().await?;
    let recent_orders = orders.recent(RECENT_ORDERS).await?;
    let status_distribution = orders
        .status_distribution()
        .await?
        .into_iter()
        .collect::<BTreeMap<_, _>>();

    Ok(Json(DashboardResponse {
        stats: DashboardStats {
            total_users,
            total_orders,
            total_revenue,
        },
        recent_orders,
        status_distribution,
    }))
}

// =============================================================================
// Users
// =============================================================================

/// List users with search and active-status filters.
///
/// GET /api/admin/users
///
/// # Errors
///
/// Returns 500 for database failures.
pub async fn list_users(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(query): Query<UserListQuery>,
) -> Result<Json<UserListResponse>> {
    let is_active = query.status.as_deref().map(|s| s == "active");
    let page = PageQuery {
        limit: query.limit,
        page: query.page,
    }
    .resolve(ADMIN_PAGE_SIZE);

    let (users, total) = UserRepository::new(state.pool())
        .list(query.search.as_deref(), is_active, page)
        .await?;

    Ok(Json(UserListResponse {
        users,
        pagination: Pagination::new(page, total),
    }))
}

/// Toggle a user's active flag.
///
/// PUT /api/admin/users/{id}/status
///
/// # Errors
///
/// Returns 404 for a missing user.
pub async fn set_user_status(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<UserId>,
    Json(req): Json<SetUserStatusRequest>,
) -> Result<Json<UserResponse>> {
    let user = UserRepository::new(state.pool())
        .set_active(id, req.is_active)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => AppError::NotFound("User".to_string()),
            other => AppError::Database(other),
        })?;

    Ok(Json(UserResponse {
        message: "User status updated successfully".to_string(),
        user,
    }))
}

// =============================================================================
// Orders
// =============================================================================

/// List orders with status/search filters and latest payment status.
///
/// GET /api/admin/orders
///
/// # Errors
///
/// Returns 400 for an unknown status filter.
pub async fn list_orders(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(query): Query<OrderListQuery>,
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
    .resolve(ADMIN_PAGE_SIZE);

    let (orders, total) = OrderRepository::new(state.pool())
        .admin_list(status, query.search.as_deref(), page)
        .await?;

    Ok(Json(OrderListResponse {
        orders,
        pagination: Pagination::new(page, total),
    }))
}

/// Full order detail with customer, items, tracking, and latest payment.
///
/// GET /api/admin/orders/{id}
///
/// # Errors
///
/// Returns 404 for a missing order.
pub async fn order_detail(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<AdminOrderDetailResponse>> {
    let orders = OrderRepository::new(state.pool());

    let order = orders
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

    let customer = UserRepository::new(state.pool())
        .get_by_id(order.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order customer".to_string()))?;

    let items = orders.items(id).await?;
    let tracking = orders.tracking(id).await?;
    let payment = PaymentRepository::new(state.pool())
        .latest_for_order(id)
        .await?;

    Ok(Json(AdminOrderDetailResponse {
        order,
        customer: CustomerBody {
            name: format!("{} {}", customer.first_name, customer.last_name),
            email: customer.email.as_str().to_owned(),
            phone: customer.phone.map(|p| p.as_str().to_owned()),
        },
        items,
        tracking,
        payment,
    }))
}

/// Force an order into any status, appending a tracking row with the actor.
///
/// PUT /api/admin/orders/{id}/status
///
/// # Errors
///
/// Returns 404 for a missing order.
pub async fn set_order_status(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<OrderId>,
    Json(req): Json<SetOrderStatusRequest>,
) -> Result<Json<MessageResponse>> {
    OrderRepository::new(state.pool())
        .set_status(
            id,
            StatusChange {
                status: req.status,
                description: req.description.as_deref(),
                location: req.location.as_deref(),
                tracking_number: req.tracking_number.as_deref(),
                updated_by: admin.current.user.id,
            },
        )
        .await?;

    Ok(Json(MessageResponse {
        message: "Order status updated successfully".to_string(),
    }))
}

// =============================================================================
// Products
// =============================================================================

/// List all products, including inactive ones.
///
/// GET /api/admin/products
///
/// # Errors
///
/// Returns 500 for database failures.
pub async fn list_products(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<ProductListResponse>> {
    let page = PageQuery {
        limit: query.limit,
        page: query.page,
    }
    .resolve(ADMIN_PAGE_SIZE);

    let (products, total) = ProductRepository::new(state.pool())
        .admin_list(query.category.as_deref(), query.search.as_deref(), page)
        .await?;

    Ok(Json(ProductListResponse {
        products,
        pagination: Pagination::new(page, total),
    }))
}

/// Create a product.
///
/// POST /api/admin/products
///
/// # Errors
///
/// Returns 400 for validation failures.
pub async fn create_product(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }
    if req.price < Decimal::ZERO {
        return Err(AppError::BadRequest("price must not be negative".to_string()));
    }
    if req.stock_quantity < 0 {
        return Err(AppError::BadRequest(
            "stockQuantity must not be negative".to_string(),
        ));
    }

    let product = ProductRepository::new(state.pool())
        .create(NewProduct {
            name: req.name.trim(),
            description: req.description.as_deref(),
            price: req.price,
            original_price: req.original_price,
            category: req.category.as_deref(),
            subcategory: req.subcategory.as_deref(),
            stock_quantity: req.stock_quantity,
            images: req.images.unwrap_or_else(|| Value::Array(Vec::new())),
            features: req
                .features
                .unwrap_or_else(|| Value::Object(serde_json::Map::new())),
            specifications: req
                .specifications
                .unwrap_or_else(|| Value::Object(serde_json::Map::new())),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            message: "Product created successfully".to_string(),
            product,
        }),
    ))
}

/// Partially update a product.
///
/// PUT /api/admin/products/{id}
///
/// # Errors
///
/// Returns 404 for a missing product, 400 for validation failures.
pub async fn update_product(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<ProductId>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>> {
    if let Some(price) = req.price
        && price < Decimal::ZERO
    {
        return Err(AppError::BadRequest("price must not be negative".to_string()));
    }
    if let Some(stock) = req.stock_quantity
        && stock < 0
    {
        return Err(AppError::BadRequest(
            "stockQuantity must not be negative".to_string(),
        ));
    }

    let product = ProductRepository::new(state.pool())
        .update(
            id,
            ProductChanges {
                name: req.name.as_deref(),
                description: req.description.as_deref(),
                price: req.price,
                original_price: req.original_price,
                category: req.category.as_deref(),
                subcategory: req.subcategory.as_deref(),
                stock_quantity: req.stock_quantity,
                is_active: req.is_active,
                images: req.images,
                features: req.features,
                specifications: req.specifications,
            },
        )
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => AppError::NotFound("Product".to_string()),
            other => AppError::Database(other),
        })?;

    Ok(Json(ProductResponse {
        message: "Product updated successfully".to_string(),
        product,
    }))
}

/// Delete a product.
///
/// DELETE /api/admin/products/{id}
///
/// # Errors
///
/// Returns 404 for a missing product.
pub async fn delete_product(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<MessageResponse>> {
    let deleted = ProductRepository::new(state.pool()).delete(id).await?;

    if !deleted {
        return Err(AppError::NotFound("Product".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "Product deleted successfully".to_string(),
    }))
}
