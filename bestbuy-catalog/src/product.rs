use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Hard ceiling on a single product listing page
pub const MAX_PAGE_SIZE: usize = 500;
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Catalog entry keyed by UPC, seeded from the store's pricebook
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: i64,
    pub upc: String,
    pub name: String,
    #[serde(default)]
    pub department: Option<String>,
    /// Vendor the store currently buys from
    #[serde(default)]
    pub current_vendor: Option<String>,
    #[serde(default)]
    pub current_cost: Option<Decimal>,
    #[serde(default)]
    pub retail_price: Option<Decimal>,
    #[serde(default = "default_pack_size")]
    pub pack_size: i32,
    #[serde(default)]
    pub on_hand: i32,
}

fn default_pack_size() -> i32 {
    1
}

/// Listing filter for the products endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub department: Option<String>,
    pub vendor: Option<String>,
    /// Case-insensitive substring of the product name
    pub search: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(department) = &self.department {
            if product.department.as_deref() != Some(department.as_str()) {
                return false;
            }
        }

        if let Some(vendor) = &self.vendor {
            if product.current_vendor.as_deref() != Some(vendor.as_str()) {
                return false;
            }
        }

        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !product.name.to_lowercase().contains(&needle) {
                return false;
            }
        }

        true
    }

    /// Page size, clamped to `MAX_PAGE_SIZE`.
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogStats {
    pub total_products: usize,
    pub products_with_cost: usize,
    pub products_with_vendor: usize,
    pub departments: usize,
}

impl CatalogStats {
    pub fn from_products<'a>(products: impl IntoIterator<Item = &'a Product>) -> Self {
        let mut stats = Self::default();
        let mut departments = std::collections::BTreeSet::new();

        for product in products {
            stats.total_products += 1;
            if product.current_cost.is_some() {
                stats.products_with_cost += 1;
            }
            if product.current_vendor.is_some() {
                stats.products_with_vendor += 1;
            }
            if let Some(department) = &product.department {
                departments.insert(department.as_str());
            }
        }

        stats.departments = departments.len();
        stats
    }
}
