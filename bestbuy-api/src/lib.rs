use axum::{
    http::{header, Method},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod error;
pub mod products;
pub mod scan;
pub mod state;
pub mod suppliers;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // Scanner clients are served from other origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::USER_AGENT]);

    let api = Router::new()
        .merge(scan::routes())
        .merge(suppliers::routes())
        .merge(products::routes());

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/best-buy", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Best Buy Scanner",
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/api/best-buy",
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
