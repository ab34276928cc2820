use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use bestbuy_catalog::{CatalogStats, Product, ProductFilter};

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/departments", get(list_departments))
        .route("/products/vendors", get(list_vendors))
        .route("/products/stats", get(catalog_stats))
        .route("/products/upc/{upc}", get(get_product_by_upc))
        .route("/products/{product_id}", get(get_product))
}

/// GET /api/best-buy/products
/// Filter by department, vendor, or name; paged with limit/offset
async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = state.repo().list_products(&filter).await?;
    Ok(Json(products))
}

async fn list_departments(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.repo().list_departments().await?))
}

async fn list_vendors(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.repo().list_vendors().await?))
}

/// GET /api/best-buy/products/stats
async fn catalog_stats(State(state): State<AppState>) -> Result<Json<CatalogStats>, AppError> {
    Ok(Json(state.repo().catalog_stats().await?))
}

/// GET /api/best-buy/products/{product_id}
async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> Result<Json<Product>, AppError> {
    state
        .repo()
        .get_product(product_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError(format!("Product {} not found", product_id)))
}

/// GET /api/best-buy/products/upc/{upc}
async fn get_product_by_upc(
    State(state): State<AppState>,
    Path(upc): Path<String>,
) -> Result<Json<Product>, AppError> {
    let upc = upc.trim();
    state.service.resolver().validate_upc(upc)?;

    state
        .repo()
        .get_product_by_upc(upc)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError(format!("Product with UPC {} not found", upc)))
}
