use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::supplier::SupplierId;

/// A supplier's own code for an item that has a standard UPC.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpcAlias {
    pub supplier_id: SupplierId,
    pub supplier_sku: String,
    /// The supplier's name for the item
    #[serde(default)]
    pub supplier_name: Option<String>,
    pub standard_upc: String,
}

/// A comparison the user chose to keep, before the store assigns an id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewComparison {
    pub upc: String,
    pub product_id: Option<i64>,
    pub scanned_at: DateTime<Utc>,
    pub scanned_by: Option<String>,
    pub current_cost: Option<Decimal>,
    pub current_vendor: Option<String>,
    pub best_supplier_id: Option<SupplierId>,
    pub best_unit_cost: Option<Decimal>,
    pub savings_per_unit: Option<Decimal>,
    pub savings_percent: Option<Decimal>,
    /// Full scan report at save time
    pub all_options: serde_json::Value,
    pub ordered_from_supplier_id: SupplierId,
    pub order_qty: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedComparison {
    pub id: i64,
    #[serde(flatten)]
    pub comparison: NewComparison,
}
