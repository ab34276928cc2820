use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use bestbuy_catalog::{
    CatalogStats, NewComparison, PriceRecord, Product, ProductFilter, SavedComparison, Supplier,
    SupplierId, UpcAlias,
};
use bestbuy_core::repository::{CatalogRepository, RepositoryError, RepositoryResult};
use tokio::sync::RwLock;
use tracing::info;

use crate::seed::SeedData;

#[derive(Default)]
struct CatalogState {
    products: BTreeMap<i64, Product>,
    suppliers: BTreeMap<SupplierId, Supplier>,
    // One slot per (UPC, supplier) pair
    prices: HashMap<(String, SupplierId), PriceRecord>,
    aliases: Vec<UpcAlias>,
    // Ids are positions + 1
    comparisons: Vec<SavedComparison>,
}

/// Process-local catalog, used for development and tests.
#[derive(Default)]
pub struct InMemoryCatalogRepository {
    state: RwLock<CatalogState>,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: SeedData) -> Self {
        info!(
            suppliers = seed.suppliers.len(),
            products = seed.products.len(),
            prices = seed.prices.len(),
            "Loading in-memory catalog"
        );

        let state = CatalogState {
            products: seed.products.into_iter().map(|p| (p.id, p)).collect(),
            suppliers: seed.suppliers.into_iter().map(|s| (s.id, s)).collect(),
            prices: seed
                .prices
                .into_iter()
                .map(|r| ((r.upc.clone(), r.supplier_id), r))
                .collect(),
            aliases: seed.aliases,
            comparisons: Vec::new(),
        };

        Self {
            state: RwLock::new(state),
        }
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn records_for_upc(&self, upc: &str) -> RepositoryResult<Vec<PriceRecord>> {
        let state = self.state.read().await;
        let mut records: Vec<PriceRecord> = state
            .prices
            .values()
            .filter(|r| r.upc == upc)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.supplier_id);
        Ok(records)
    }

    async fn list_suppliers(&self, active_only: bool) -> RepositoryResult<Vec<Supplier>> {
        let state = self.state.read().await;
        let mut suppliers: Vec<Supplier> = state
            .suppliers
            .values()
            .filter(|s| !active_only || s.is_active)
            .cloned()
            .collect();
        suppliers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(suppliers)
    }

    async fn get_supplier(&self, id: SupplierId) -> RepositoryResult<Option<Supplier>> {
        Ok(self.state.read().await.suppliers.get(&id).cloned())
    }

    async fn list_products(&self, filter: &ProductFilter) -> RepositoryResult<Vec<Product>> {
        let state = self.state.read().await;
        let mut products: Vec<&Product> = state
            .products
            .values()
            .filter(|p| filter.matches(p))
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(products
            .into_iter()
            .skip(filter.offset())
            .take(filter.limit())
            .cloned()
            .collect())
    }

    async fn get_product(&self, id: i64) -> RepositoryResult<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn get_product_by_upc(&self, upc: &str) -> RepositoryResult<Option<Product>> {
        let state = self.state.read().await;
        Ok(state.products.values().find(|p| p.upc == upc).cloned())
    }

    async fn list_departments(&self) -> RepositoryResult<Vec<String>> {
        let state = self.state.read().await;
        let departments: BTreeSet<String> = state
            .products
            .values()
            .filter_map(|p| p.department.clone())
            .collect();
        Ok(departments.into_iter().collect())
    }

    async fn list_vendors(&self) -> RepositoryResult<Vec<String>> {
        let state = self.state.read().await;
        let vendors: BTreeSet<String> = state
            .products
            .values()
            .filter_map(|p| p.current_vendor.clone())
            .collect();
        Ok(vendors.into_iter().collect())
    }

    async fn catalog_stats(&self) -> RepositoryResult<CatalogStats> {
        let state = self.state.read().await;
        Ok(CatalogStats::from_products(state.products.values()))
    }

    async fn supplier_prices(
        &self,
        supplier_id: SupplierId,
        limit: usize,
    ) -> RepositoryResult<Vec<PriceRecord>> {
        let state = self.state.read().await;
        let mut records: Vec<PriceRecord> = state
            .prices
            .values()
            .filter(|r| r.supplier_id == supplier_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.effective_date
                .cmp(&a.effective_date)
                .then_with(|| a.upc.cmp(&b.upc))
        });
        records.truncate(limit);
        Ok(records)
    }

    async fn upsert_price(&self, record: PriceRecord) -> RepositoryResult<PriceRecord> {
        record
            .validate()
            .map_err(|e| RepositoryError::InvalidRecord(e.to_string()))?;

        let mut state = self.state.write().await;
        if !state.suppliers.contains_key(&record.supplier_id) {
            return Err(RepositoryError::SupplierNotFound(record.supplier_id));
        }

        state
            .prices
            .insert((record.upc.clone(), record.supplier_id), record.clone());
        Ok(record)
    }

    async fn aliases_for_upc(&self, standard_upc: &str) -> RepositoryResult<Vec<UpcAlias>> {
        let state = self.state.read().await;
        Ok(state
            .aliases
            .iter()
            .filter(|a| a.standard_upc == standard_upc)
            .cloned()
            .collect())
    }

    async fn save_comparison(
        &self,
        comparison: NewComparison,
    ) -> RepositoryResult<SavedComparison> {
        let mut state = self.state.write().await;
        let saved = SavedComparison {
            id: state.comparisons.len() as i64 + 1,
            comparison,
        };
        state.comparisons.push(saved.clone());
        Ok(saved)
    }

    async fn recent_comparisons(&self, limit: usize) -> RepositoryResult<Vec<SavedComparison>> {
        let state = self.state.read().await;
        Ok(state.comparisons.iter().rev().take(limit).cloned().collect())
    }
}
