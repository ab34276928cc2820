use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::supplier::SupplierId;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriceType {
    #[default]
    List,
    Promo,
    Contract,
}

/// Largest cost a quote may carry (NUMERIC(10, 4) in the price table)
pub const MAX_COST: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 4);

const MAX_UPC_LEN: usize = 20;
const MAX_SKU_LEN: usize = 50;
const MAX_PROMO_LEN: usize = 100;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum PriceError {
    #[error("unit cost must not be negative: {0}")]
    NegativeUnitCost(Decimal),

    #[error("case cost must not be negative: {0}")]
    NegativeCaseCost(Decimal),

    #[error("case pack must be at least 1, got {0}")]
    InvalidCasePack(i32),

    #[error("cost {0} exceeds the maximum of {MAX_COST}")]
    CostTooLarge(Decimal),

    #[error("{field} is longer than {max} characters")]
    FieldTooLong { field: &'static str, max: usize },

    #[error("currency must be a three-letter ISO 4217 code, got {0:?}")]
    InvalidCurrency(String),
}

/// One supplier's quoted wholesale price for one UPC.
///
/// A store holds at most one record per (UPC, supplier) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceRecord {
    pub upc: String,
    pub supplier_id: SupplierId,
    #[serde(default)]
    pub supplier_sku: Option<String>,
    pub unit_cost: Decimal,
    #[serde(default)]
    pub case_cost: Option<Decimal>,
    #[serde(default = "default_case_pack")]
    pub case_pack: i32,
    /// ISO 4217 code; `None` means the configured base currency
    #[serde(default)]
    pub currency: Option<String>,
    pub effective_date: DateTime<Utc>,
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

impl PriceRecord {
    pub fn new(
        upc: impl Into<String>,
        supplier_id: SupplierId,
        unit_cost: Decimal,
        effective_date: DateTime<Utc>,
    ) -> Result<Self, PriceError> {
        let record = Self {
            upc: upc.into(),
            supplier_id,
            supplier_sku: None,
            unit_cost,
            case_cost: None,
            case_pack: default_case_pack(),
            currency: None,
            effective_date,
            expires_at: None,
            price_type: PriceType::List,
            promo_name: None,
            in_stock: true,
        };
        record.validate()?;
        Ok(record)
    }

    /// Reject shapes deserialization cannot rule out.
    pub fn validate(&self) -> Result<(), PriceError> {
        if self.unit_cost.is_sign_negative() && !self.unit_cost.is_zero() {
            return Err(PriceError::NegativeUnitCost(self.unit_cost));
        }
        if let Some(case_cost) = self.case_cost {
            if case_cost.is_sign_negative() && !case_cost.is_zero() {
                return Err(PriceError::NegativeCaseCost(case_cost));
            }
        }
        if self.case_pack < 1 {
            return Err(PriceError::InvalidCasePack(self.case_pack));
        }
        for cost in std::iter::once(self.unit_cost).chain(self.case_cost) {
            if cost > MAX_COST {
                return Err(PriceError::CostTooLarge(cost));
            }
        }

        check_len("upc", Some(&self.upc), MAX_UPC_LEN)?;
        check_len("supplier_sku", self.supplier_sku.as_deref(), MAX_SKU_LEN)?;
        check_len("promo_name", self.promo_name.as_deref(), MAX_PROMO_LEN)?;

        if let Some(currency) = &self.currency {
            if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(PriceError::InvalidCurrency(currency.clone()));
            }
        }
        Ok(())
    }

    pub fn with_case_pack(mut self, case_pack: i32) -> Self {
        self.case_pack = case_pack;
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn out_of_stock(mut self) -> Self {
        self.in_stock = false;
        self
    }

    /// Quoted case cost, or unit cost times case pack when none was quoted.
    pub fn effective_case_cost(&self) -> Decimal {
        self.case_cost
            .unwrap_or_else(|| self.unit_cost * Decimal::from(self.case_pack))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

fn check_len(field: &'static str, value: Option<&str>, max: usize) -> Result<(), PriceError> {
    match value {
        Some(v) if v.chars().count() > max => Err(PriceError::FieldTooLong { field, max }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_unit_cost_rejected() {
        let result = PriceRecord::new("012345", 1, Decimal::new(-1, 2), Utc::now());
        assert_eq!(result, Err(PriceError::NegativeUnitCost(Decimal::new(-1, 2))));
    }

    #[test]
    fn test_zero_cost_is_allowed() {
        assert!(PriceRecord::new("012345", 1, Decimal::ZERO, Utc::now()).is_ok());
    }

    #[test]
    fn test_effective_case_cost_defaults_from_pack() {
        let record = PriceRecord::new("012345", 1, Decimal::new(125, 2), Utc::now())
            .unwrap()
            .with_case_pack(12);
        assert_eq!(record.effective_case_cost(), Decimal::new(1500, 2));
    }

    #[test]
    fn test_deserialize_applies_defaults() {
        let json = r#"{
            "upc": "012345678905",
            "supplier_id": 3,
            "unit_cost": 1.25,
            "effective_date": "2024-06-01T00:00:00Z"
        }"#;
        let record: PriceRecord = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(record.case_pack, 1);
        assert!(record.in_stock);
        assert_eq!(record.price_type, PriceType::List);
        assert_eq!(record.unit_cost, Decimal::new(125, 2));
    }

    #[test]
    fn test_column_limits_enforced() {
        let now = Utc::now();
        assert_eq!(MAX_COST, Decimal::new(9_999_999_999, 4));
        assert!(PriceRecord::new("012345", 1, MAX_COST, now).is_ok());
        assert_eq!(
            PriceRecord::new("012345", 1, Decimal::new(1_234_567, 0), now),
            Err(PriceError::CostTooLarge(Decimal::new(1_234_567, 0)))
        );

        let record = PriceRecord::new("012345", 1, Decimal::ONE, now).unwrap();
        assert!(record.clone().with_currency("usd").validate().is_ok());
        assert_eq!(
            record.clone().with_currency("DOLLARS").validate(),
            Err(PriceError::InvalidCurrency("DOLLARS".to_string()))
        );

        let mut long_sku = record.clone();
        long_sku.supplier_sku = Some("X".repeat(51));
        assert_eq!(
            long_sku.validate(),
            Err(PriceError::FieldTooLong { field: "supplier_sku", max: 50 })
        );

        let mut long_promo = record;
        long_promo.promo_name = Some("Deal ".repeat(30));
        assert!(long_promo.validate().is_err());

        assert!(PriceRecord::new("1".repeat(21), 1, Decimal::ONE, now).is_err());
    }
}
