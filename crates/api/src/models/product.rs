//! Catalog product model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use orchard_core::{CurrencyCode, ProductId};

/// A catalog entry.
///
/// `stock_quantity` is the only mutable counter; the database enforces that
/// it never goes negative and decrements happen through conditional updates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub currency: CurrencyCode,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub images: Value,
    pub features: Value,
    pub specifications: Value,
    pub stock_quantity: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
