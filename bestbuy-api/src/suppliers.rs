use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bestbuy_catalog::{PriceRecord, Supplier, SupplierId};
use bestbuy_core::ManualPriceEntry;
use serde::Deserialize;

use crate::{error::AppError, state::AppState};

const DEFAULT_PRICE_LIMIT: usize = 100;
const MAX_PRICE_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
pub struct ListSuppliersQuery {
    #[serde(default = "default_active_only")]
    pub active_only: bool,
}

fn default_active_only() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct SupplierPricesQuery {
    pub limit: Option<usize>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/suppliers", get(list_suppliers))
        .route("/suppliers/{supplier_id}", get(get_supplier))
        .route(
            "/suppliers/{supplier_id}/prices",
            get(supplier_prices).post(add_price),
        )
}

/// GET /api/best-buy/suppliers
async fn list_suppliers(
    State(state): State<AppState>,
    Query(query): Query<ListSuppliersQuery>,
) -> Result<Json<Vec<Supplier>>, AppError> {
    let suppliers = state.repo().list_suppliers(query.active_only).await?;
    Ok(Json(suppliers))
}

/// GET /api/best-buy/suppliers/{supplier_id}
async fn get_supplier(
    State(state): State<AppState>,
    Path(supplier_id): Path<SupplierId>,
) -> Result<Json<Supplier>, AppError> {
    let supplier = find_supplier(&state, supplier_id).await?;
    Ok(Json(supplier))
}

/// GET /api/best-buy/suppliers/{supplier_id}/prices
/// Most recent quotes first
async fn supplier_prices(
    State(state): State<AppState>,
    Path(supplier_id): Path<SupplierId>,
    Query(query): Query<SupplierPricesQuery>,
) -> Result<Json<Vec<PriceRecord>>, AppError> {
    find_supplier(&state, supplier_id).await?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_PRICE_LIMIT)
        .clamp(1, MAX_PRICE_LIMIT);
    let prices = state.repo().supplier_prices(supplier_id, limit).await?;
    Ok(Json(prices))
}

/// POST /api/best-buy/suppliers/{supplier_id}/prices
/// Manual entry replaces the supplier's previous quote for the UPC
async fn add_price(
    State(state): State<AppState>,
    Path(supplier_id): Path<SupplierId>,
    Json(mut entry): Json<ManualPriceEntry>,
) -> Result<(StatusCode, Json<PriceRecord>), AppError> {
    entry.upc = entry.upc.trim().to_string();
    let record = state.service.add_price(supplier_id, entry).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn find_supplier(state: &AppState, supplier_id: SupplierId) -> Result<Supplier, AppError> {
    state
        .repo()
        .get_supplier(supplier_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Supplier {} not found", supplier_id)))
}
