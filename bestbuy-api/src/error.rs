use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bestbuy_core::CoreError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    NotFoundError(String),
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("{0}")]
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, "invalid_input", msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::ServiceUnavailable(msg) => {
                tracing::error!("Data source unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "data_source_unavailable",
                    "Price data is temporarily unavailable".to_string(),
                )
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
            "kind": kind,
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput(msg) => AppError::ValidationError(msg),
            CoreError::NotFound(msg) => AppError::NotFoundError(msg),
            CoreError::DataSourceUnavailable(msg) => AppError::ServiceUnavailable(msg),
            CoreError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<bestbuy_core::repository::RepositoryError> for AppError {
    fn from(err: bestbuy_core::repository::RepositoryError) -> Self {
        CoreError::from(err).into()
    }
}

impl From<bestbuy_catalog::ResolveError> for AppError {
    fn from(err: bestbuy_catalog::ResolveError) -> Self {
        CoreError::from(err).into()
    }
}
