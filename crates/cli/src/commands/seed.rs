//! Catalog seeding command.
//!
//! Inserts a handful of sample products so a fresh environment has a
//! browsable catalog. Safe to re-run: products are matched by name and
//! skipped when present.

use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;

use super::{CommandError, connect};

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    price: Decimal,
    category: &'static str,
    subcategory: &'static str,
    stock_quantity: i32,
}

fn catalog() -> Vec<SeedProduct> {
    vec![
        SeedProduct {
            name: "Classic Cotton T-Shirt",
            description: "Mid-weight combed cotton tee with a relaxed fit.",
            price: Decimal::new(79900, 2),
            category: "apparel",
            subcategory: "t-shirts",
            stock_quantity: 120,
        },
        SeedProduct {
            name: "Everyday Canvas Tote",
            description: "Heavy canvas tote with interior zip pocket.",
            price: Decimal::new(129900, 2),
            category: "accessories",
            subcategory: "bags",
            stock_quantity: 60,
        },
        SeedProduct {
            name: "Insulated Steel Bottle 750ml",
            description: "Double-wall vacuum bottle, keeps drinks cold for 24h.",
            price: Decimal::new(159900, 2),
            category: "accessories",
            subcategory: "drinkware",
            stock_quantity: 85,
        },
        SeedProduct {
            name: "Merino Crew Socks (3-pack)",
            description: "Breathable merino blend, reinforced heel and toe.",
            price: Decimal::new(89900, 2),
            category: "apparel",
            subcategory: "socks",
            stock_quantity: 200,
        },
    ]
}

/// Seed the catalog with sample products.
///
/// # Errors
///
/// Returns `CommandError` if the connection or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    tracing::info!("Connecting to database...");
    let pool = connect().await?;

    let mut inserted = 0usize;
    for product in catalog() {
        if insert_if_absent(&pool, &product).await? {
            inserted += 1;
        }
    }

    tracing::info!(inserted, "Seed complete");
    Ok(())
}

async fn insert_if_absent(pool: &PgPool, product: &SeedProduct) -> Result<bool, CommandError> {
    let exists: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM products WHERE name = $1")
        .bind(product.name)
        .fetch_optional(pool)
        .await?;

    if exists.is_some() {
        tracing::debug!(name = product.name, "product already seeded, skipping");
        return Ok(false);
    }

    sqlx::query(
        "INSERT INTO products ( \
            name, description, price, category, subcategory, stock_quantity, \
            images, features, specifications \
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(product.name)
    .bind(product.description)
    .bind(product.price)
    .bind(product.category)
    .bind(product.subcategory)
    .bind(product.stock_quantity)
    .bind(json!([]))
    .bind(json!({}))
    .bind(json!({}))
    .execute(pool)
    .await?;

    Ok(true)
}
