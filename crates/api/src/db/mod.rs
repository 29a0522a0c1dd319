//! Database operations for the Orchard `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Customer accounts (email, phone, or Google provisioned)
//! - `admin_users` - Administrator role records
//! - `user_addresses` - Address book entries
//! - `products` - Catalog entries with stock counters
//! - `orders` / `order_items` / `order_tracking` - Orders, immutable line
//!   item snapshots, and the append-only tracking log
//! - `payments` - Gateway payment attempts and snapshots
//! - `otp_codes` - One-time passcodes for phone verification
//! - `user_sessions` - Bearer-token blacklist (logout revocation)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p orchard-cli -- migrate
//! ```

pub mod addresses;
pub mod orders;
pub mod otp;
pub mod payments;
pub mod products;
pub mod sessions;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use orders::OrderRepository;
pub use otp::OtpRepository;
pub use payments::PaymentRepository;
pub use products::ProductRepository;
pub use sessions::TokenBlacklistRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
