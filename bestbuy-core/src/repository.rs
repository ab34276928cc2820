use async_trait::async_trait;
use bestbuy_catalog::{
    CatalogStats, NewComparison, PriceRecord, Product, ProductFilter, SavedComparison, Supplier,
    SupplierId, UpcAlias,
};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Backend could not be reached or failed mid-query
    #[error("data source unavailable: {0}")]
    Unavailable(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("supplier {0} not found")]
    SupplierNotFound(SupplierId),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Read access to products, suppliers and their quotes, plus manual price entry
/// and saved comparisons.
///
/// Implementations hold at most one price record per (UPC, supplier) pair.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Every quote stored for `upc`, regardless of age or stock.
    async fn records_for_upc(&self, upc: &str) -> RepositoryResult<Vec<PriceRecord>>;

    /// Suppliers ordered by name.
    async fn list_suppliers(&self, active_only: bool) -> RepositoryResult<Vec<Supplier>>;

    async fn get_supplier(&self, id: SupplierId) -> RepositoryResult<Option<Supplier>>;

    /// Products matching `filter`, ordered by name and paged.
    async fn list_products(&self, filter: &ProductFilter) -> RepositoryResult<Vec<Product>>;

    async fn get_product(&self, id: i64) -> RepositoryResult<Option<Product>>;

    async fn get_product_by_upc(&self, upc: &str) -> RepositoryResult<Option<Product>>;

    async fn list_departments(&self) -> RepositoryResult<Vec<String>>;

    async fn list_vendors(&self) -> RepositoryResult<Vec<String>>;

    async fn catalog_stats(&self) -> RepositoryResult<CatalogStats>;

    /// Most recent quotes first.
    async fn supplier_prices(
        &self,
        supplier_id: SupplierId,
        limit: usize,
    ) -> RepositoryResult<Vec<PriceRecord>>;

    /// Store `record`, replacing any quote for the same (UPC, supplier) pair.
    async fn upsert_price(&self, record: PriceRecord) -> RepositoryResult<PriceRecord>;

    /// Supplier codes registered for `standard_upc`.
    async fn aliases_for_upc(&self, standard_upc: &str) -> RepositoryResult<Vec<UpcAlias>>;

    async fn save_comparison(
        &self,
        comparison: NewComparison,
    ) -> RepositoryResult<SavedComparison>;

    /// Newest first.
    async fn recent_comparisons(&self, limit: usize) -> RepositoryResult<Vec<SavedComparison>>;
}
