//! Catalog route handlers (public, optional auth).

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use orchard_core::{PageQuery, Pagination, ProductId};

use crate::db::ProductRepository;
use crate::db::products::{ProductFilter, ProductSort, SortOrder};
use crate::error::{AppError, Result};
use crate::middleware::OptionalUser;
use crate::models::product::Product;
use crate::state::AppState;

/// Default page size for catalog listings.
const CATALOG_PAGE_SIZE: i64 = 20;
/// Default result count for search.
const SEARCH_LIMIT: i64 = 10;
/// Default result count for the featured rail.
const FEATURED_LIMIT: i64 = 6;

// =============================================================================
// Query / Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub subcategory: Option<String>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub product: Product,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: BTreeMap<String, Vec<String>>,
}

// =============================================================================
// Handlers
// =============================================================================

/// List active products with filters, sorting, and pagination.
///
/// GET /api/products
///
/// # Errors
///
/// Returns 500 for database failures.
pub async fn list(
    State(state): State<AppState>,
    OptionalUser(_): OptionalUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ProductListResponse>> {
    let page = PageQuery {
        limit: query.limit,
        page: query.page,
    }
    .resolve(CATALOG_PAGE_SIZE);

    let filter = ProductFilter {
        category: query.category.as_deref(),
        subcategory: query.subcategory.as_deref(),
        search: query.search.as_deref(),
        sort: ProductSort::parse_or_default(query.sort.as_deref()),
        order: SortOrder::parse_or_default(query.order.as_deref()),
    };

    let (products, total) = ProductRepository::new(state.pool())
        .list(&filter, page)
        .await?;

    Ok(Json(ProductListResponse {
        products,
        pagination: Pagination::new(page, total),
    }))
}

/// Get a single active product.
///
/// GET /api/products/{id}
///
/// # Errors
///
/// Returns 404 when the product is missing or inactive.
pub async fn show(
    State(state): State<AppState>,
    OptionalUser(_): OptionalUser,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductResponse>> {
    let product = ProductRepository::new(state.pool())
        .get_active(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    Ok(Json(ProductResponse { product }))
}

/// Category map over active products.
///
/// GET /api/products/categories/list
///
/// # Errors
///
/// Returns 500 for database failures.
pub async fn categories(State(state): State<AppState>) -> Result<Json<CategoriesResponse>> {
    let rows = ProductRepository::new(state.pool()).categories().await?;

    let mut categories: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (category, subcategory) in rows {
        let entry = categories.entry(category).or_default();
        if let Some(sub) = subcategory
            && !entry.contains(&sub)
        {
            entry.push(sub);
        }
    }

    Ok(Json(CategoriesResponse { categories }))
}

/// Search active products, ranking name prefix matches first.
///
/// GET /api/products/search/{query}
///
/// # Errors
///
/// Returns 500 for database failures.
pub async fn search(
    State(state): State<AppState>,
    OptionalUser(_): OptionalUser,
    Path(query): Path<String>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<ProductsResponse>> {
    let limit = params.limit.unwrap_or(SEARCH_LIMIT).clamp(1, 100);
    let products = ProductRepository::new(state.pool())
        .search(&query, limit)
        .await?;

    Ok(Json(ProductsResponse { products }))
}

/// Newest active products.
///
/// GET /api/products/featured/list
///
/// # Errors
///
/// Returns 500 for database failures.
pub async fn featured(
    State(state): State<AppState>,
    OptionalUser(_): OptionalUser,
    Query(params): Query<LimitQuery>,
) -> Result<Json<ProductsResponse>> {
    let limit = params.limit.unwrap_or(FEATURED_LIMIT).clamp(1, 100);
    let products = ProductRepository::new(state.pool()).featured(limit).await?;

    Ok(Json(ProductsResponse { products }))
}

/// Paginated listing within one category.
///
/// GET /api/products/category/{category}
///
/// # Errors
///
/// Returns 500 for database failures.
pub async fn by_category(
    State(state): State<AppState>,
    OptionalUser(_): OptionalUser,
    Path(category): Path<String>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<ProductListResponse>> {
    let page = PageQuery {
        limit: query.limit,
        page: query.page,
    }
    .resolve(CATALOG_PAGE_SIZE);

    let filter = ProductFilter {
        category: Some(&category),
        subcategory: query.subcategory.as_deref(),
        search: None,
        sort: ProductSort::CreatedAt,
        order: SortOrder::Desc,
    };

    let (products, total) = ProductRepository::new(state.pool())
        .list(&filter, page)
        .await?;

    Ok(Json(ProductListResponse {
        products,
        pagination: Pagination::new(page, total),
    }))
}
