pub mod repository;
pub mod service;

use bestbuy_catalog::{PriceError, ResolveError};
use repository::RepositoryError;

pub use repository::{CatalogRepository, RepositoryResult};
pub use service::{
    BatchReport, BestBuyService, ManualPriceEntry, SaveComparisonRequest, ScanOptions, ScanReport,
};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Data source unavailable: {0}")]
    DataSourceUnavailable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl From<ResolveError> for CoreError {
    fn from(err: ResolveError) -> Self {
        CoreError::InvalidInput(err.to_string())
    }
}

impl From<PriceError> for CoreError {
    fn from(err: PriceError) -> Self {
        CoreError::InvalidInput(err.to_string())
    }
}

impl From<RepositoryError> for CoreError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Unavailable(msg) => CoreError::DataSourceUnavailable(msg),
            RepositoryError::InvalidRecord(msg) => CoreError::InvalidInput(msg),
            RepositoryError::SupplierNotFound(id) => {
                CoreError::NotFound(format!("Supplier {} not found", id))
            }
        }
    }
}
