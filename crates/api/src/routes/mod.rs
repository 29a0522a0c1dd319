//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! # Identity
//! POST /api/auth/signup        - Email/password registration
//! POST /api/auth/login         - Email/password login
//! POST /api/auth/send-otp      - Issue a phone OTP
//! POST /api/auth/verify-otp    - Verify OTP, login or provision
//! POST /api/auth/google        - Google login or provision
//! GET  /api/auth/me            - Resolve the caller
//! POST /api/auth/logout        - Blacklist the current token
//!
//! # Profile (requires auth)
//! GET  /api/users/profile              - Profile + addresses
//! PUT  /api/users/profile              - Partial profile update
//! PUT  /api/users/change-password      - Change password
//! GET  /api/users/addresses            - List addresses
//! POST /api/users/addresses            - Add address
//! PUT  /api/users/addresses/{id}       - Update address
//! DELETE /api/users/addresses/{id}     - Delete address
//! PUT  /api/users/addresses/{id}/default - Make default
//!
//! # Catalog (public / optional auth)
//! GET  /api/products                   - Filtered listing
//! GET  /api/products/{id}              - Product detail
//! GET  /api/products/categories/list   - Category map
//! GET  /api/products/search/{query}    - Ranked search
//! GET  /api/products/featured/list     - Newest products
//! GET  /api/products/category/{category} - Category listing
//!
//! # Orders (requires auth unless noted)
//! POST /api/orders                     - Create order
//! GET  /api/orders/my-orders           - Own orders
//! GET  /api/orders/{id}                - Own order detail
//! PUT  /api/orders/{id}/cancel         - Cancel pending order
//! GET  /api/orders/track/{orderNumber} - Guest/owner tracking (optional auth)
//!
//! # Payments (requires auth; refund requires admin)
//! POST /api/payments/create-order      - Create gateway intent
//! POST /api/payments/verify            - Verify callback, flip statuses
//! GET  /api/payments/status/{orderId}  - Payment status for an order
//! GET  /api/payments/history           - Own payment history
//! POST /api/payments/refund/{paymentId} - Refund (admin)
//!
//! # Admin (requires admin)
//! GET  /api/admin/dashboard            - Stats, recent orders, distribution
//! GET  /api/admin/users                - User management listing
//! PUT  /api/admin/users/{id}/status    - Toggle active flag
//! GET  /api/admin/orders               - Order management listing
//! GET  /api/admin/orders/{id}          - Order detail with customer
//! PUT  /api/admin/orders/{id}/status   - Force status transition
//! GET/POST /api/admin/products         - Product management
//! PUT/DELETE /api/admin/products/{id}  - Product management
//! ```

pub mod admin;
pub mod auth;
pub mod orders;
pub mod payments;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/send-otp", post(auth::send_otp))
        .route("/verify-otp", post(auth::verify_otp))
        .route("/google", post(auth::google))
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout))
}

/// Create the profile/address routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(users::get_profile).put(users::update_profile))
        .route("/change-password", put(users::change_password))
        .route(
            "/addresses",
            get(users::list_addresses).post(users::add_address),
        )
        .route(
            "/addresses/{id}",
            put(users::update_address).delete(users::delete_address),
        )
        .route("/addresses/{id}/default", put(users::set_default_address))
}

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list))
        .route("/categories/list", get(products::categories))
        .route("/search/{query}", get(products::search))
        .route("/featured/list", get(products::featured))
        .route("/category/{category}", get(products::by_category))
        .route("/{id}", get(products::show))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create))
        .route("/my-orders", get(orders::my_orders))
        .route("/track/{order_number}", get(orders::track))
        .route("/{id}", get(orders::show))
        .route("/{id}/cancel", put(orders::cancel))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/create-order", post(payments::create_order))
        .route("/verify", post(payments::verify))
        .route("/status/{order_id}", get(payments::status))
        .route("/history", get(payments::history))
        .route("/refund/{payment_id}", post(payments::refund))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(admin::dashboard))
        .route("/users", get(admin::list_users))
        .route("/users/{id}/status", put(admin::set_user_status))
        .route("/orders", get(admin::list_orders))
        .route("/orders/{id}", get(admin::order_detail))
        .route("/orders/{id}/status", put(admin::set_order_status))
        .route(
            "/products",
            get(admin::list_products).post(admin::create_product),
        )
        .route(
            "/products/{id}",
            put(admin::update_product).delete(admin::delete_product),
        )
}

/// Assemble the full `/api` router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/products", product_routes())
        .nest("/orders", order_routes())
        .nest("/payments", payment_routes())
        .nest("/admin", admin_routes())
}
