use std::collections::HashMap;
use std::sync::Arc;

use bestbuy_catalog::stats::{price_age_hours, savings_percent, savings_vs_current};
use bestbuy_catalog::upc::format_variants;
use bestbuy_catalog::{
    landed_cost_per_unit, ComparisonResult, ComparisonStatus, NewComparison, PriceRecord,
    PriceResolver, PriceStatistics, PriceType, PriceWindow, Product, SavedComparison, Supplier,
    SupplierId,
};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::repository::CatalogRepository;
use crate::{CoreError, CoreResult};

pub const DEFAULT_RESULT_LIMIT: usize = 10;

const NOT_FOUND_MESSAGE: &str = "No suppliers found for this UPC";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub window: PriceWindow,
    /// Max options returned; statistics still cover all of them
    pub limit: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            window: PriceWindow::default(),
            limit: DEFAULT_RESULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductInfo {
    pub id: i64,
    pub name: String,
    pub department: Option<String>,
    pub current_cost: Option<Decimal>,
    pub current_vendor: Option<String>,
    pub retail_price: Option<Decimal>,
    pub pack_size: i32,
}

impl From<&Product> for ProductInfo {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            department: product.department.clone(),
            current_cost: product.current_cost,
            current_vendor: product.current_vendor.clone(),
            retail_price: product.retail_price,
            pack_size: product.pack_size,
        }
    }
}

/// A supplier quote as shown to the scanner
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PriceOption {
    pub rank: usize,
    pub supplier_id: SupplierId,
    pub supplier_name: String,
    pub supplier_code: String,
    pub unit_cost: Decimal,
    pub case_cost: Decimal,
    pub case_pack: i32,
    pub landed_cost_per_unit: Decimal,
    pub effective_date: DateTime<Utc>,
    pub price_age_hours: Decimal,
    pub in_stock: bool,
    pub price_type: PriceType,
    pub promo_name: Option<String>,
    pub savings_vs_current: Option<Decimal>,
    pub is_best: bool,
}

/// Response to a single scan
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScanReport {
    pub upc: String,
    pub status: ComparisonStatus,
    pub currency: String,
    pub product: Option<ProductInfo>,
    pub prices: Vec<PriceOption>,
    pub best: Option<PriceOption>,
    pub tied_supplier_ids: Vec<SupplierId>,
    pub statistics: Option<PriceStatistics>,
    pub suppliers_checked: usize,
    pub comparison_time: DateTime<Utc>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum BatchEntry {
    Report(Box<ScanReport>),
    Rejected { upc: String, error: String },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BatchSummary {
    pub items_compared: usize,
    pub items_with_prices: usize,
    pub total_potential_savings: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BatchReport {
    pub comparisons: Vec<BatchEntry>,
    pub summary: BatchSummary,
}

/// Manual price entry for one supplier
#[derive(Debug, Clone, Deserialize)]
pub struct ManualPriceEntry {
    pub upc: String,
    pub unit_cost: Decimal,
    #[serde(default)]
    pub case_cost: Option<Decimal>,
    #[serde(default = "default_case_pack")]
    pub case_pack: i32,
    #[serde(default)]
    pub price_type: PriceType,
    #[serde(default)]
    pub promo_name: Option<String>,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    #[serde(default)]
    pub supplier_sku: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

fn default_case_pack() -> i32 {
    1
}

fn default_in_stock() -> bool {
    true
}

/// Keep the comparison behind a scan, noting the supplier the user picked
#[derive(Debug, Clone, Deserialize)]
pub struct SaveComparisonRequest {
    pub upc: String,
    pub selected_supplier_id: SupplierId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default)]
    pub user_id: Option<String>,
}

fn default_quantity() -> i32 {
    1
}

const MAX_USER_ID_LEN: usize = 50;

/// A code to look quotes up under. Alias codes only count for their supplier.
struct LookupCode {
    code: String,
    supplier: Option<SupplierId>,
}

/// Scanning workflow: fetch quotes, narrow them, resolve, enrich.
pub struct BestBuyService {
    repo: Arc<dyn CatalogRepository>,
    resolver: PriceResolver,
}

impl BestBuyService {
    pub fn new(repo: Arc<dyn CatalogRepository>, resolver: PriceResolver) -> Self {
        Self { repo, resolver }
    }

    pub fn repository(&self) -> &Arc<dyn CatalogRepository> {
        &self.repo
    }

    pub fn resolver(&self) -> &PriceResolver {
        &self.resolver
    }

    /// Compare supplier prices for one UPC.
    pub async fn scan(&self, upc: &str, options: &ScanOptions) -> CoreResult<ScanReport> {
        // Reject bad codes before touching the store.
        self.resolver.validate_upc(upc)?;

        let codes = self.lookup_codes(upc).await?;
        let mut records = Vec::new();
        for lookup in &codes {
            let found = self.repo.records_for_upc(&lookup.code).await?;
            // Quotes filed under a twin or alias code are compared as the scanned code.
            records.extend(
                found
                    .into_iter()
                    .filter(|r| r.upc == lookup.code)
                    .filter(|r| lookup.supplier.is_none_or(|id| id == r.supplier_id))
                    .map(|mut r| {
                        r.upc = upc.to_string();
                        r
                    }),
            );
        }

        let mut product = None;
        for lookup in codes.iter().filter(|c| c.supplier.is_none()) {
            product = self.repo.get_product_by_upc(&lookup.code).await?;
            if product.is_some() {
                break;
            }
        }

        let suppliers: HashMap<SupplierId, Supplier> = self
            .repo
            .list_suppliers(false)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        let now = Utc::now();
        let eligible: Vec<PriceRecord> = options
            .window
            .select(&records, now)
            .into_iter()
            .filter(|r| suppliers.get(&r.supplier_id).is_some_and(|s| s.is_active))
            .collect();

        let comparison = self.resolver.resolve(upc, &eligible)?;

        info!(
            upc,
            codes = codes.len(),
            stored = records.len(),
            eligible = eligible.len(),
            status = ?comparison.status,
            "Scan resolved"
        );

        Ok(build_report(comparison, product.as_ref(), &suppliers, options.limit, now))
    }

    /// Scan by catalog product id.
    pub async fn scan_product(&self, product_id: i64, options: &ScanOptions) -> CoreResult<ScanReport> {
        let product = self
            .repo
            .get_product(product_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Product {} not found", product_id)))?;

        self.scan(&product.upc, options).await
    }

    /// Scan several UPCs; malformed ones are reported per item.
    pub async fn batch_compare(
        &self,
        upcs: &[String],
        options: &ScanOptions,
    ) -> CoreResult<BatchReport> {
        let mut comparisons = Vec::with_capacity(upcs.len());
        let mut items_with_prices = 0;
        let mut total_potential_savings = Decimal::ZERO;

        for upc in upcs {
            match self.scan(upc, options).await {
                Ok(report) => {
                    if !report.prices.is_empty() {
                        items_with_prices += 1;
                    }
                    // Statistics cover every eligible option, not just the
                    // `limit` shown, so the total is independent of truncation.
                    if let Some(savings) = report
                        .statistics
                        .as_ref()
                        .and_then(|s| s.potential_savings)
                    {
                        total_potential_savings += savings;
                    }
                    comparisons.push(BatchEntry::Report(Box::new(report)));
                }
                Err(CoreError::InvalidInput(error)) => {
                    warn!(upc = %upc, %error, "Skipping malformed UPC in batch");
                    comparisons.push(BatchEntry::Rejected {
                        upc: upc.clone(),
                        error,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(BatchReport {
            summary: BatchSummary {
                items_compared: comparisons.len(),
                items_with_prices,
                total_potential_savings: total_potential_savings
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            },
            comparisons,
        })
    }

    /// Record a manually entered quote, replacing the supplier's previous one.
    pub async fn add_price(
        &self,
        supplier_id: SupplierId,
        entry: ManualPriceEntry,
    ) -> CoreResult<PriceRecord> {
        self.resolver.validate_upc(&entry.upc)?;

        if self.repo.get_supplier(supplier_id).await?.is_none() {
            return Err(CoreError::NotFound(format!("Supplier {} not found", supplier_id)));
        }

        let record = PriceRecord {
            upc: entry.upc,
            supplier_id,
            supplier_sku: entry.supplier_sku,
            unit_cost: entry.unit_cost,
            case_cost: entry.case_cost,
            case_pack: entry.case_pack,
            currency: entry.currency,
            effective_date: Utc::now(),
            expires_at: entry.expires_at,
            price_type: entry.price_type,
            promo_name: entry.promo_name,
            in_stock: entry.in_stock,
        };
        record.validate()?;

        let stored = self.repo.upsert_price(record).await?;
        info!(upc = %stored.upc, supplier_id, unit_cost = %stored.unit_cost, "Price recorded");
        Ok(stored)
    }

    /// The scanned code, its UPC-A / EAN-13 twin, and supplier aliases of either.
    async fn lookup_codes(&self, upc: &str) -> CoreResult<Vec<LookupCode>> {
        let variants = format_variants(upc);
        let mut codes: Vec<LookupCode> = variants
            .iter()
            .map(|code| LookupCode {
                code: code.clone(),
                supplier: None,
            })
            .collect();

        for variant in &variants {
            for alias in self.repo.aliases_for_upc(variant).await? {
                let known = codes.iter().any(|c| {
                    c.code == alias.supplier_sku && c.supplier.is_none_or(|id| id == alias.supplier_id)
                });
                if !known {
                    codes.push(LookupCode {
                        code: alias.supplier_sku,
                        supplier: Some(alias.supplier_id),
                    });
                }
            }
        }

        Ok(codes)
    }

    /// Re-run the scan and keep its result, with the supplier the user picked.
    pub async fn save_comparison(
        &self,
        request: SaveComparisonRequest,
        options: &ScanOptions,
    ) -> CoreResult<SavedComparison> {
        if request.quantity < 1 {
            return Err(CoreError::InvalidInput(format!(
                "quantity must be at least 1, got {}",
                request.quantity
            )));
        }
        if request
            .user_id
            .as_deref()
            .is_some_and(|u| u.chars().count() > MAX_USER_ID_LEN)
        {
            return Err(CoreError::InvalidInput(format!(
                "user_id is longer than {} characters",
                MAX_USER_ID_LEN
            )));
        }

        let report = self.scan(&request.upc, options).await?;
        if report.status == ComparisonStatus::NotFound {
            return Err(CoreError::NotFound(NOT_FOUND_MESSAGE.to_string()));
        }
        if self
            .repo
            .get_supplier(request.selected_supplier_id)
            .await?
            .is_none()
        {
            return Err(CoreError::NotFound(format!(
                "Supplier {} not found",
                request.selected_supplier_id
            )));
        }

        let all_options =
            serde_json::to_value(&report).map_err(|e| CoreError::Internal(e.to_string()))?;
        let current_cost = report.product.as_ref().and_then(|p| p.current_cost);
        let savings_per_unit = report.statistics.as_ref().and_then(|s| s.potential_savings);

        let comparison = NewComparison {
            upc: report.upc.clone(),
            product_id: report.product.as_ref().map(|p| p.id),
            scanned_at: report.comparison_time,
            scanned_by: request.user_id,
            current_cost,
            current_vendor: report.product.as_ref().and_then(|p| p.current_vendor.clone()),
            best_supplier_id: report.best.as_ref().map(|b| b.supplier_id),
            best_unit_cost: report.best.as_ref().map(|b| b.unit_cost),
            savings_per_unit,
            savings_percent: savings_percent(current_cost, savings_per_unit),
            all_options,
            ordered_from_supplier_id: request.selected_supplier_id,
            order_qty: request.quantity,
        };

        let saved = self.repo.save_comparison(comparison).await?;
        info!(
            id = saved.id,
            upc = %saved.comparison.upc,
            supplier_id = saved.comparison.ordered_from_supplier_id,
            "Comparison saved"
        );
        Ok(saved)
    }
}

fn build_report(
    comparison: ComparisonResult,
    product: Option<&Product>,
    suppliers: &HashMap<SupplierId, Supplier>,
    limit: usize,
    now: DateTime<Utc>,
) -> ScanReport {
    let current_cost = product.and_then(|p| p.current_cost);
    let best_supplier = comparison.best.as_ref().map(|r| r.supplier_id);

    let options: Vec<PriceOption> = comparison
        .records
        .iter()
        .enumerate()
        .filter_map(|(i, record)| {
            let supplier = suppliers.get(&record.supplier_id)?;
            Some(PriceOption {
                rank: i + 1,
                supplier_id: supplier.id,
                supplier_name: supplier.name.clone(),
                supplier_code: supplier.code.clone(),
                unit_cost: record.unit_cost,
                case_cost: record.effective_case_cost(),
                case_pack: record.case_pack,
                landed_cost_per_unit: landed_cost_per_unit(
                    record.unit_cost,
                    record.case_pack,
                    supplier.shipping.as_ref(),
                ),
                effective_date: record.effective_date,
                price_age_hours: price_age_hours(record.effective_date, now),
                in_stock: record.in_stock,
                price_type: record.price_type,
                promo_name: record.promo_name.clone(),
                savings_vs_current: savings_vs_current(current_cost, record.unit_cost),
                is_best: Some(record.supplier_id) == best_supplier,
            })
        })
        .collect();

    let costs: Vec<Decimal> = options.iter().map(|o| o.unit_cost).collect();
    let statistics = PriceStatistics::from_costs(&costs, current_cost);
    let best = options.iter().find(|o| o.is_best).cloned();
    let suppliers_checked = options.len();
    let tied_supplier_ids = comparison.tied_supplier_ids();

    let message = match comparison.status {
        ComparisonStatus::NotFound => Some(NOT_FOUND_MESSAGE.to_string()),
        ComparisonStatus::Found => None,
    };

    ScanReport {
        upc: comparison.upc,
        status: comparison.status,
        currency: comparison.currency,
        product: product.map(ProductInfo::from),
        prices: options.into_iter().take(limit).collect(),
        best,
        tied_supplier_ids,
        statistics,
        suppliers_checked,
        comparison_time: now,
        message,
    }
}
