use std::collections::HashSet;
use std::path::Path;

use bestbuy_catalog::{PriceRecord, PriceType, Product, Supplier, SupplierId, UpcAlias};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Failed to read seed file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse seed data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid seed data: {0}")]
    Invalid(String),
}

/// Quote as written in a seed file; `effective_date` defaults to load time.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedPrice {
    pub upc: String,
    pub supplier_id: SupplierId,
    #[serde(default)]
    pub supplier_sku: Option<String>,
    pub unit_cost: Decimal,
    #[serde(default)]
    pub case_cost: Option<Decimal>,
    #[serde(default = "default_case_pack")]
    pub case_pack: i32,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub effective_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub price_type: PriceType,
    #[serde(default)]
    pub promo_name: Option<String>,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

fn default_case_pack() -> i32 {
    1
}

fn default_in_stock() -> bool {
    true
}

impl SeedPrice {
    pub fn into_record(self, loaded_at: DateTime<Utc>) -> PriceRecord {
        PriceRecord {
            upc: self.upc,
            supplier_id: self.supplier_id,
            supplier_sku: self.supplier_sku,
            unit_cost: self.unit_cost,
            case_cost: self.case_cost,
            case_pack: self.case_pack,
            currency: self.currency,
            effective_date: self.effective_date.unwrap_or(loaded_at),
            expires_at: self.expires_at,
            price_type: self.price_type,
            promo_name: self.promo_name,
            in_stock: self.in_stock,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawSeed {
    #[serde(default)]
    suppliers: Vec<Supplier>,
    #[serde(default)]
    products: Vec<Product>,
    #[serde(default)]
    prices: Vec<SeedPrice>,
    #[serde(default)]
    aliases: Vec<UpcAlias>,
}

/// Validated starting data for a repository
#[derive(Debug, Clone, Default)]
pub struct SeedData {
    pub suppliers: Vec<Supplier>,
    pub products: Vec<Product>,
    pub prices: Vec<PriceRecord>,
    pub aliases: Vec<UpcAlias>,
}

impl SeedData {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(json: &str) -> Result<Self, SeedError> {
        let raw: RawSeed = serde_json::from_str(json)?;
        let loaded_at = Utc::now();

        let seed = Self {
            suppliers: raw.suppliers,
            products: raw.products,
            prices: raw
                .prices
                .into_iter()
                .map(|p| p.into_record(loaded_at))
                .collect(),
            aliases: raw.aliases,
        };
        seed.validate()?;
        Ok(seed)
    }

    fn validate(&self) -> Result<(), SeedError> {
        let mut supplier_ids = HashSet::new();
        for supplier in &self.suppliers {
            if !supplier_ids.insert(supplier.id) {
                return Err(SeedError::Invalid(format!("duplicate supplier id {}", supplier.id)));
            }
        }

        let mut product_ids = HashSet::new();
        let mut upcs = HashSet::new();
        for product in &self.products {
            if !product_ids.insert(product.id) {
                return Err(SeedError::Invalid(format!("duplicate product id {}", product.id)));
            }
            if !upcs.insert(product.upc.as_str()) {
                return Err(SeedError::Invalid(format!("duplicate product UPC {}", product.upc)));
            }
        }

        let mut pairs = HashSet::new();
        for price in &self.prices {
            price
                .validate()
                .map_err(|e| SeedError::Invalid(format!("price for {}: {}", price.upc, e)))?;
            if !supplier_ids.contains(&price.supplier_id) {
                return Err(SeedError::Invalid(format!(
                    "price for {} references unknown supplier {}",
                    price.upc, price.supplier_id
                )));
            }
            if !pairs.insert((price.upc.as_str(), price.supplier_id)) {
                return Err(SeedError::Invalid(format!(
                    "more than one price for UPC {} from supplier {}",
                    price.upc, price.supplier_id
                )));
            }
        }

        let mut skus = HashSet::new();
        for alias in &self.aliases {
            if !supplier_ids.contains(&alias.supplier_id) {
                return Err(SeedError::Invalid(format!(
                    "alias {} references unknown supplier {}",
                    alias.supplier_sku, alias.supplier_id
                )));
            }
            if !skus.insert((alias.supplier_id, alias.supplier_sku.as_str())) {
                return Err(SeedError::Invalid(format!(
                    "duplicate alias {} for supplier {}",
                    alias.supplier_sku, alias.supplier_id
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SEED: &str = r#"{
        "suppliers": [
            { "id": 1, "code": "HACKNEY", "name": "HT Hackney" },
            { "id": 2, "code": "MCLANE", "name": "McLane Company",
              "shipping": { "per_case_fee": 1.5 } }
        ],
        "products": [
            { "id": 1, "upc": "012345", "name": "Cola 20oz", "current_cost": 1.10 }
        ],
        "prices": [
            { "upc": "012345", "supplier_id": 1, "unit_cost": 1.05 },
            { "upc": "012345", "supplier_id": 2, "unit_cost": 0.99, "case_pack": 24 }
        ]
    }"#;

    #[test]
    fn test_seed_parses_with_defaults() {
        let seed = SeedData::from_json(SEED).unwrap();
        assert_eq!(seed.suppliers.len(), 2);
        assert_eq!(seed.suppliers[0].order_lead_days, 2);
        assert!(seed.suppliers[0].is_active);
        assert_eq!(seed.products[0].pack_size, 1);
        assert_eq!(seed.prices[1].case_pack, 24);
    }

    #[test]
    fn test_seed_rejects_duplicate_pair() {
        let json = r#"{
            "suppliers": [{ "id": 1, "code": "A", "name": "A" }],
            "prices": [
                { "upc": "X", "supplier_id": 1, "unit_cost": 1.0 },
                { "upc": "X", "supplier_id": 1, "unit_cost": 2.0 }
            ]
        }"#;
        assert!(matches!(SeedData::from_json(json), Err(SeedError::Invalid(_))));
    }

    #[test]
    fn test_seed_rejects_unknown_supplier() {
        let json = r#"{ "prices": [{ "upc": "X", "supplier_id": 7, "unit_cost": 1.0 }] }"#;
        assert!(matches!(SeedData::from_json(json), Err(SeedError::Invalid(_))));
    }

    #[test]
    fn test_seed_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SEED.as_bytes()).unwrap();

        let seed = SeedData::from_path(file.path()).unwrap();
        assert_eq!(seed.prices.len(), 2);

        assert!(matches!(
            SeedData::from_path("/nonexistent/seed.json"),
            Err(SeedError::Io { .. })
        ));
    }

    #[test]
    fn test_seed_aliases_must_name_known_supplier() {
        let json = r#"{
            "suppliers": [{ "id": 1, "code": "A", "name": "A" }],
            "aliases": [{ "supplier_id": 1, "supplier_sku": "HT-1", "standard_upc": "012345" }]
        }"#;
        let seed = SeedData::from_json(json).unwrap();
        assert_eq!(seed.aliases[0].standard_upc, "012345");

        let json = r#"{
            "aliases": [{ "supplier_id": 9, "supplier_sku": "HT-1", "standard_upc": "012345" }]
        }"#;
        assert!(matches!(SeedData::from_json(json), Err(SeedError::Invalid(_))));
    }
}
