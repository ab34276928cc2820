use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bestbuy_catalog::SavedComparison;
use bestbuy_core::{BatchReport, SaveComparisonRequest, ScanOptions, ScanReport};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, state::AppState};

/// Upper bound on UPCs in one batch request
pub const MAX_BATCH_SIZE: usize = 100;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ScanQuery {
    pub max_age_hours: Option<i64>,
    pub include_out_of_stock: Option<bool>,
    pub limit: Option<usize>,
}

impl ScanQuery {
    /// Overlay the request's overrides on the configured defaults.
    pub fn apply(&self, defaults: ScanOptions) -> Result<ScanOptions, AppError> {
        let mut options = defaults;

        if let Some(hours) = self.max_age_hours {
            options.window.max_age_hours = hours;
            options
                .window
                .validate()
                .map_err(|e| AppError::ValidationError(e.to_string()))?;
        }
        if let Some(include) = self.include_out_of_stock {
            options.window.include_out_of_stock = include;
        }
        if let Some(limit) = self.limit {
            if limit == 0 {
                return Err(AppError::ValidationError("limit must be at least 1".to_string()));
            }
            options.limit = limit;
        }

        Ok(options)
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub upcs: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ComparisonsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SaveComparisonResponse {
    pub id: i64,
    pub status: &'static str,
}

const DEFAULT_HISTORY_LIMIT: usize = 50;
const MAX_HISTORY_LIMIT: usize = 500;

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        // The static segment shadows `/scan/{upc}`, so GET scans "batch" as a code.
        .route("/scan/batch", post(batch_compare).get(scan_batch_code))
        .route("/scan/save", post(save_comparison))
        .route("/scan/product/{product_id}", get(scan_product))
        .route("/scan/{upc}", get(scan_upc))
        .route("/comparisons", get(recent_comparisons))
}

/// GET /api/best-buy/scan/{upc}
/// Compare every active supplier's current quote for a scanned code
async fn scan_upc(
    State(state): State<AppState>,
    Path(upc): Path<String>,
    Query(query): Query<ScanQuery>,
) -> Result<Json<ScanReport>, AppError> {
    scan_code(&state, upc.trim(), &query).await
}

/// GET /api/best-buy/scan/batch
async fn scan_batch_code(
    State(state): State<AppState>,
    Query(query): Query<ScanQuery>,
) -> Result<Json<ScanReport>, AppError> {
    scan_code(&state, "batch", &query).await
}

async fn scan_code(
    state: &AppState,
    upc: &str,
    query: &ScanQuery,
) -> Result<Json<ScanReport>, AppError> {
    let options = query.apply(state.scan_defaults)?;
    let report = state.service.scan(upc, &options).await?;
    Ok(Json(report))
}

/// GET /api/best-buy/scan/product/{product_id}
async fn scan_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    Query(query): Query<ScanQuery>,
) -> Result<Json<ScanReport>, AppError> {
    let options = query.apply(state.scan_defaults)?;
    let report = state.service.scan_product(product_id, &options).await?;
    Ok(Json(report))
}

/// POST /api/best-buy/scan/batch
async fn batch_compare(
    State(state): State<AppState>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<BatchReport>, AppError> {
    if req.upcs.is_empty() {
        return Err(AppError::ValidationError("upcs must not be empty".to_string()));
    }
    if req.upcs.len() > MAX_BATCH_SIZE {
        return Err(AppError::ValidationError(format!(
            "At most {} UPCs per batch",
            MAX_BATCH_SIZE
        )));
    }

    let upcs: Vec<String> = req.upcs.iter().map(|u| u.trim().to_string()).collect();
    let report = state
        .service
        .batch_compare(&upcs, &state.scan_defaults)
        .await?;
    Ok(Json(report))
}

/// POST /api/best-buy/scan/save
/// Re-run the comparison and keep it with the supplier the user picked
async fn save_comparison(
    State(state): State<AppState>,
    Json(mut req): Json<SaveComparisonRequest>,
) -> Result<(StatusCode, Json<SaveComparisonResponse>), AppError> {
    req.upc = req.upc.trim().to_string();
    let saved = state
        .service
        .save_comparison(req, &state.scan_defaults)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SaveComparisonResponse {
            id: saved.id,
            status: "saved",
        }),
    ))
}

/// GET /api/best-buy/comparisons
async fn recent_comparisons(
    State(state): State<AppState>,
    Query(query): Query<ComparisonsQuery>,
) -> Result<Json<Vec<SavedComparison>>, AppError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    Ok(Json(state.repo().recent_comparisons(limit).await?))
}
