use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::price::PriceRecord;
use crate::supplier::SupplierId;
use crate::upc::{self, UpcError, UpcValidation};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CurrencyAssumption {
    /// Every quote is compared as an amount in the base currency
    #[default]
    SingleCurrencyOnly,
}

/// Resolver settings, loaded from the `[pricing]` config section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolverConfig {
    #[serde(default)]
    pub upc_validation: UpcValidation,
    #[serde(default)]
    pub currency_assumption: CurrencyAssumption,
    /// Base currency for records that carry none
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            upc_validation: UpcValidation::default(),
            currency_assumption: CurrencyAssumption::default(),
            currency: default_currency(),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] UpcError),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonStatus {
    Found,
    NotFound,
}

/// Outcome of comparing every supplier quote for one UPC
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ComparisonResult {
    pub upc: String,
    pub status: ComparisonStatus,
    pub currency: String,
    /// Matching records, cheapest first, then by supplier id
    pub records: Vec<PriceRecord>,
    /// Records sharing the minimum price, by supplier id
    pub tied: Vec<PriceRecord>,
    /// First of `tied`
    pub best: Option<PriceRecord>,
}

impl ComparisonResult {
    fn not_found(upc: &str, currency: &str) -> Self {
        Self {
            upc: upc.to_string(),
            status: ComparisonStatus::NotFound,
            currency: currency.to_string(),
            records: Vec::new(),
            tied: Vec::new(),
            best: None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.status == ComparisonStatus::Found
    }

    pub fn tied_supplier_ids(&self) -> Vec<SupplierId> {
        self.tied.iter().map(|r| r.supplier_id).collect()
    }
}

/// Picks the cheapest supplier quote for a UPC.
///
/// Stateless apart from its configuration, so one instance can be shared
/// across request handlers.
#[derive(Debug, Clone, Default)]
pub struct PriceResolver {
    config: ResolverConfig,
}

impl PriceResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn validate_upc(&self, upc: &str) -> Result<(), ResolveError> {
        upc::validate(upc, self.config.upc_validation)?;
        Ok(())
    }

    /// Compare the quotes in `records` that match `upc`.
    ///
    /// `records` may hold quotes for other UPCs; they are ignored. An unknown
    /// UPC yields a `NotFound` result, not an error.
    pub fn resolve(
        &self,
        upc: &str,
        records: &[PriceRecord],
    ) -> Result<ComparisonResult, ResolveError> {
        self.validate_upc(upc)?;

        // Keyed by supplier so iteration comes out in ascending id order.
        let mut by_supplier: BTreeMap<SupplierId, &PriceRecord> = BTreeMap::new();

        for record in records.iter().filter(|r| r.upc == upc) {
            if let Some(currency) = record.currency.as_deref() {
                if currency != self.config.currency {
                    tracing::warn!(
                        upc,
                        supplier_id = record.supplier_id,
                        currency,
                        base = %self.config.currency,
                        "Quote in foreign currency compared as base currency amount"
                    );
                }
            }

            match by_supplier.entry(record.supplier_id) {
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
                Entry::Occupied(mut slot) => {
                    tracing::warn!(
                        upc,
                        supplier_id = record.supplier_id,
                        "Duplicate quote for supplier, keeping the most recent"
                    );
                    if supersedes(record, slot.get()) {
                        slot.insert(record);
                    }
                }
            }
        }

        if by_supplier.is_empty() {
            return Ok(ComparisonResult::not_found(upc, &self.config.currency));
        }

        let mut matched: Vec<PriceRecord> = by_supplier.into_values().cloned().collect();
        // Stable sort keeps supplier id order among equal prices.
        matched.sort_by(|a, b| a.unit_cost.cmp(&b.unit_cost));

        let min_price = matched[0].unit_cost;
        let tied: Vec<PriceRecord> = matched
            .iter()
            .take_while(|r| r.unit_cost == min_price)
            .cloned()
            .collect();
        let best = tied.first().cloned();

        Ok(ComparisonResult {
            upc: upc.to_string(),
            status: ComparisonStatus::Found,
            currency: self.config.currency.clone(),
            records: matched,
            tied,
            best,
        })
    }
}

/// Later effective date wins; on the same date the lower price does.
fn supersedes(candidate: &PriceRecord, current: &PriceRecord) -> bool {
    match candidate.effective_date.cmp(&current.effective_date) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => candidate.unit_cost < current.unit_cost,
    }
}

/// Longest staleness limit a scan may ask for (ten years)
pub const MAX_AGE_HOURS_LIMIT: i64 = 87_600;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("max_age_hours must be between 1 and {MAX_AGE_HOURS_LIMIT}, got {0}")]
    MaxAgeOutOfRange(i64),
}

/// Which quotes are eligible for a scan
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceWindow {
    /// Quotes older than this are stale
    pub max_age_hours: i64,
    pub include_out_of_stock: bool,
}

impl Default for PriceWindow {
    fn default() -> Self {
        Self {
            max_age_hours: 168,
            include_out_of_stock: false,
        }
    }
}

impl PriceWindow {
    pub fn validate(&self) -> Result<(), WindowError> {
        if !(1..=MAX_AGE_HOURS_LIMIT).contains(&self.max_age_hours) {
            return Err(WindowError::MaxAgeOutOfRange(self.max_age_hours));
        }
        Ok(())
    }

    pub fn admits(&self, record: &PriceRecord, now: DateTime<Utc>) -> bool {
        // A limit beyond chrono's range puts no floor on age.
        let fresh_enough = Duration::try_hours(self.max_age_hours)
            .and_then(|age| now.checked_sub_signed(age))
            .is_none_or(|cutoff| record.effective_date >= cutoff);

        fresh_enough
            && record.effective_date <= now
            && !record.is_expired(now)
            && (self.include_out_of_stock || record.in_stock)
    }

    pub fn select(&self, records: &[PriceRecord], now: DateTime<Utc>) -> Vec<PriceRecord> {
        records
            .iter()
            .filter(|r| self.admits(r, now))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn quote(upc: &str, supplier_id: SupplierId, cents: i64) -> PriceRecord {
        PriceRecord::new(upc, supplier_id, Decimal::new(cents, 2), Utc::now()).unwrap()
    }

    fn sample_records() -> Vec<PriceRecord> {
        vec![
            quote("012345", 1, 450),
            quote("012345", 2, 399),
            quote("999999", 1, 100),
        ]
    }

    #[test]
    fn test_resolve_picks_cheapest() {
        let resolver = PriceResolver::default();
        let result = resolver.resolve("012345", &sample_records()).unwrap();

        assert!(result.is_found());
        assert_eq!(result.records.len(), 2);
        let best = result.best.expect("best record");
        assert_eq!(best.supplier_id, 2);
        assert_eq!(best.unit_cost, Decimal::new(399, 2));
        assert!(result.records.iter().all(|r| best.unit_cost <= r.unit_cost));
    }

    #[test]
    fn test_unknown_upc_is_not_found() {
        let resolver = PriceResolver::default();
        let result = resolver.resolve("000000", &sample_records()).unwrap();

        assert_eq!(result.status, ComparisonStatus::NotFound);
        assert!(result.records.is_empty());
        assert!(result.tied.is_empty());
        assert!(result.best.is_none());
    }

    #[test]
    fn test_tie_goes_to_lowest_supplier_id() {
        let resolver = PriceResolver::default();
        // Supplier 2 listed first to show order of input does not matter
        let records = vec![quote("X", 2, 200), quote("X", 1, 200), quote("X", 3, 250)];

        let result = resolver.resolve("X", &records).unwrap();
        assert_eq!(result.best.as_ref().map(|r| r.supplier_id), Some(1));
        assert_eq!(result.tied_supplier_ids(), vec![1, 2]);
        assert_eq!(
            result.records.iter().map(|r| r.supplier_id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_empty_upc_is_invalid() {
        let resolver = PriceResolver::default();
        let result = resolver.resolve("", &sample_records());
        assert_eq!(result, Err(ResolveError::InvalidInput(UpcError::Empty)));
    }

    #[test]
    fn test_strict_mode_rejects_malformed_upc() {
        let resolver = PriceResolver::new(ResolverConfig {
            upc_validation: UpcValidation::Strict,
            ..Default::default()
        });
        assert!(resolver.resolve("012345", &sample_records()).is_err());
        assert!(resolver.resolve("036000291452", &sample_records()).is_ok());
    }

    #[test]
    fn test_resolve_is_idempotent_and_pure() {
        let resolver = PriceResolver::default();
        let records = sample_records();
        let snapshot = records.clone();

        let first = resolver.resolve("012345", &records).unwrap();
        let second = resolver.resolve("012345", &records).unwrap();

        assert_eq!(first, second);
        assert_eq!(records, snapshot);
    }

    #[test]
    fn test_duplicate_supplier_quotes_collapse_to_latest() {
        let resolver = PriceResolver::default();
        let now = Utc::now();
        let older = PriceRecord::new("X", 1, Decimal::new(100, 2), now - Duration::hours(5)).unwrap();
        let newer = PriceRecord::new("X", 1, Decimal::new(300, 2), now).unwrap();

        let result = resolver.resolve("X", &[older, newer]).unwrap();
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.best.unwrap().unit_cost, Decimal::new(300, 2));
    }

    #[test]
    fn test_window_filters_stale_expired_and_out_of_stock() {
        let now = Utc::now();
        let window = PriceWindow::default();

        let fresh = quote("X", 1, 100);
        let stale = PriceRecord::new("X", 2, Decimal::ONE, now - Duration::hours(200)).unwrap();
        let expired = quote("X", 3, 100).with_expiry(now - Duration::minutes(1));
        let future = PriceRecord::new("X", 4, Decimal::ONE, now + Duration::hours(1)).unwrap();
        let sold_out = quote("X", 5, 100).out_of_stock();

        let records = vec![fresh, stale, expired, future, sold_out];
        let selected = window.select(&records, now + Duration::seconds(1));
        assert_eq!(
            selected.iter().map(|r| r.supplier_id).collect::<Vec<_>>(),
            vec![1]
        );

        let with_out_of_stock = PriceWindow {
            include_out_of_stock: true,
            ..window
        };
        let selected = with_out_of_stock.select(&records, now + Duration::seconds(1));
        assert_eq!(
            selected.iter().map(|r| r.supplier_id).collect::<Vec<_>>(),
            vec![1, 5]
        );
    }

    #[test]
    fn test_window_bounds() {
        assert!(PriceWindow::default().validate().is_ok());
        for hours in [0, -5, MAX_AGE_HOURS_LIMIT + 1, i64::MAX] {
            let window = PriceWindow {
                max_age_hours: hours,
                ..Default::default()
            };
            assert_eq!(window.validate(), Err(WindowError::MaxAgeOutOfRange(hours)));
        }
    }

    #[test]
    fn test_window_with_huge_age_does_not_panic() {
        let now = Utc::now();
        let old = PriceRecord::new("X", 1, Decimal::ONE, now - Duration::days(3650)).unwrap();

        for hours in [3_000_000_000, i64::MAX] {
            let window = PriceWindow {
                max_age_hours: hours,
                ..Default::default()
            };
            assert!(window.admits(&old, now));
        }
    }
}
