use async_trait::async_trait;
use bestbuy_catalog::{
    CatalogStats, NewComparison, PriceRecord, PriceType, Product, ProductFilter, SavedComparison,
    ShippingTerms, Supplier, SupplierId, UpcAlias,
};
use bestbuy_core::repository::{CatalogRepository, RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{error, info, warn};

use crate::seed::SeedData;

const PRODUCT_COLUMNS: &str = "id, upc, name, department, current_vendor, current_cost, \
     retail_price, pack_size, on_hand";

const SUPPLIER_COLUMNS: &str = "id, code, name, contact_name, phone, email, min_order_amount, \
     order_lead_days, delivery_days, is_active, per_case_fee, flat_fee, free_shipping_threshold";

const PRICE_COLUMNS: &str = "upc, supplier_id, supplier_sku, unit_cost, case_cost, case_pack, \
     currency, effective_date, expires_at, price_type, promo_name, in_stock";

const COMPARISON_COLUMNS: &str = "id, upc, product_id, scanned_at, scanned_by, current_cost, \
     current_vendor, best_supplier_id, best_unit_cost, savings_per_unit, savings_percent, \
     all_options, ordered_from_supplier_id, order_qty";

/// PostgreSQL-backed catalog
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load `seed` when the products table is empty.
    pub async fn seed_if_empty(&self, seed: &SeedData) -> RepositoryResult<()> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await
            .map_err(unavailable)?;

        if count > 0 {
            info!("Database has {} products, skipping seed", count);
            return Ok(());
        }

        info!("Database empty - seeding initial data...");
        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        for s in &seed.suppliers {
            let shipping = s.shipping.clone().unwrap_or_default();
            sqlx::query(
                r#"
                INSERT INTO suppliers (id, code, name, contact_name, phone, email, min_order_amount,
                    order_lead_days, delivery_days, is_active, per_case_fee, flat_fee, free_shipping_threshold)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                "#,
            )
            .bind(s.id)
            .bind(&s.code)
            .bind(&s.name)
            .bind(&s.contact_name)
            .bind(&s.phone)
            .bind(&s.email)
            .bind(s.min_order_amount)
            .bind(s.order_lead_days)
            .bind(&s.delivery_days)
            .bind(s.is_active)
            .bind(shipping.per_case_fee)
            .bind(shipping.flat_fee)
            .bind(shipping.free_shipping_threshold)
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;
        }

        for p in &seed.products {
            sqlx::query(
                r#"
                INSERT INTO products (id, upc, name, department, current_vendor, current_cost,
                    retail_price, pack_size, on_hand)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(p.id)
            .bind(&p.upc)
            .bind(&p.name)
            .bind(&p.department)
            .bind(&p.current_vendor)
            .bind(p.current_cost)
            .bind(p.retail_price)
            .bind(p.pack_size)
            .bind(p.on_hand)
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;
        }

        for record in &seed.prices {
            insert_price(&mut *tx, record).await.map_err(unavailable)?;
        }

        for alias in &seed.aliases {
            sqlx::query(
                r#"
                INSERT INTO upc_aliases (supplier_id, supplier_sku, supplier_name, standard_upc)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(alias.supplier_id)
            .bind(&alias.supplier_sku)
            .bind(&alias.supplier_name)
            .bind(&alias.standard_upc)
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;
        }

        // Explicit ids bypass the sequences; move them past the seeded rows.
        for table in ["suppliers", "products"] {
            let statement = format!(
                "SELECT setval(pg_get_serial_sequence('{table}', 'id'), COALESCE(MAX(id), 0) + 1, false) FROM {table}"
            );
            sqlx::query(&statement)
                .execute(&mut *tx)
                .await
                .map_err(unavailable)?;
        }

        tx.commit().await.map_err(unavailable)?;
        info!(
            "Seeding complete: {} suppliers, {} products, {} prices",
            seed.suppliers.len(),
            seed.products.len(),
            seed.prices.len()
        );
        Ok(())
    }
}

fn unavailable(err: sqlx::Error) -> RepositoryError {
    error!("Catalog query failed: {:?}", err);
    RepositoryError::Unavailable(err.to_string())
}

/// Data exceptions (class 22) and check violations are bad input, not an outage.
fn is_rejected_input(sqlstate: &str) -> bool {
    sqlstate.starts_with("22") || sqlstate == "23514"
}

fn write_error(err: sqlx::Error) -> RepositoryError {
    let rejected = err
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| is_rejected_input(&code));

    if rejected {
        warn!("Catalog write rejected: {}", err);
        return RepositoryError::InvalidRecord(err.to_string());
    }
    unavailable(err)
}

/// Upsert one quote and return the row as stored (NUMERIC columns round).
async fn insert_price<'e, E>(executor: E, record: &PriceRecord) -> Result<PriceRecord, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let row: PriceRow = sqlx::query_as(&format!(
        r#"
        INSERT INTO supplier_prices (upc, supplier_id, supplier_sku, unit_cost, case_cost, case_pack,
            currency, effective_date, expires_at, price_type, promo_name, in_stock)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (upc, supplier_id) DO UPDATE SET
            supplier_sku = EXCLUDED.supplier_sku,
            unit_cost = EXCLUDED.unit_cost,
            case_cost = EXCLUDED.case_cost,
            case_pack = EXCLUDED.case_pack,
            currency = EXCLUDED.currency,
            effective_date = EXCLUDED.effective_date,
            expires_at = EXCLUDED.expires_at,
            price_type = EXCLUDED.price_type,
            promo_name = EXCLUDED.promo_name,
            in_stock = EXCLUDED.in_stock
        RETURNING {PRICE_COLUMNS}
        "#
    ))
    .bind(&record.upc)
    .bind(record.supplier_id)
    .bind(&record.supplier_sku)
    .bind(record.unit_cost)
    .bind(record.case_cost)
    .bind(record.case_pack)
    .bind(&record.currency)
    .bind(record.effective_date)
    .bind(record.expires_at)
    .bind(price_type_str(record.price_type))
    .bind(&record.promo_name)
    .bind(record.in_stock)
    .fetch_one(executor)
    .await?;

    Ok(row.into())
}

fn price_type_str(price_type: PriceType) -> &'static str {
    match price_type {
        PriceType::List => "list",
        PriceType::Promo => "promo",
        PriceType::Contract => "contract",
    }
}

fn parse_price_type(raw: &str) -> PriceType {
    match raw {
        "promo" => PriceType::Promo,
        "contract" => PriceType::Contract,
        _ => PriceType::List,
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    upc: String,
    name: String,
    department: Option<String>,
    current_vendor: Option<String>,
    current_cost: Option<Decimal>,
    retail_price: Option<Decimal>,
    pack_size: i32,
    on_hand: i32,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            upc: row.upc,
            name: row.name,
            department: row.department,
            current_vendor: row.current_vendor,
            current_cost: row.current_cost,
            retail_price: row.retail_price,
            pack_size: row.pack_size,
            on_hand: row.on_hand,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SupplierRow {
    id: i64,
    code: String,
    name: String,
    contact_name: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    min_order_amount: Option<Decimal>,
    order_lead_days: i32,
    delivery_days: Option<String>,
    is_active: bool,
    per_case_fee: Option<Decimal>,
    flat_fee: Option<Decimal>,
    free_shipping_threshold: Option<Decimal>,
}

impl From<SupplierRow> for Supplier {
    fn from(row: SupplierRow) -> Self {
        let has_shipping = row.per_case_fee.is_some()
            || row.flat_fee.is_some()
            || row.free_shipping_threshold.is_some();

        Supplier {
            id: row.id,
            code: row.code,
            name: row.name,
            contact_name: row.contact_name,
            phone: row.phone,
            email: row.email,
            min_order_amount: row.min_order_amount,
            order_lead_days: row.order_lead_days,
            delivery_days: row.delivery_days,
            is_active: row.is_active,
            shipping: has_shipping.then_some(ShippingTerms {
                per_case_fee: row.per_case_fee,
                flat_fee: row.flat_fee,
                free_shipping_threshold: row.free_shipping_threshold,
            }),
        }
    }
}

#[derive(sqlx::FromRow)]
struct PriceRow {
    upc: String,
    supplier_id: i64,
    supplier_sku: Option<String>,
    unit_cost: Decimal,
    case_cost: Option<Decimal>,
    case_pack: i32,
    currency: Option<String>,
    effective_date: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    price_type: String,
    promo_name: Option<String>,
    in_stock: bool,
}

impl From<PriceRow> for PriceRecord {
    fn from(row: PriceRow) -> Self {
        PriceRecord {
            upc: row.upc,
            supplier_id: row.supplier_id,
            supplier_sku: row.supplier_sku,
            unit_cost: row.unit_cost,
            case_cost: row.case_cost,
            case_pack: row.case_pack,
            currency: row.currency,
            effective_date: row.effective_date,
            expires_at: row.expires_at,
            price_type: parse_price_type(&row.price_type),
            promo_name: row.promo_name,
            in_stock: row.in_stock,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AliasRow {
    supplier_id: i64,
    supplier_sku: String,
    supplier_name: Option<String>,
    standard_upc: String,
}

impl From<AliasRow> for UpcAlias {
    fn from(row: AliasRow) -> Self {
        UpcAlias {
            supplier_id: row.supplier_id,
            supplier_sku: row.supplier_sku,
            supplier_name: row.supplier_name,
            standard_upc: row.standard_upc,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ComparisonRow {
    id: i64,
    upc: String,
    product_id: Option<i64>,
    scanned_at: DateTime<Utc>,
    scanned_by: Option<String>,
    current_cost: Option<Decimal>,
    current_vendor: Option<String>,
    best_supplier_id: Option<i64>,
    best_unit_cost: Option<Decimal>,
    savings_per_unit: Option<Decimal>,
    savings_percent: Option<Decimal>,
    all_options: serde_json::Value,
    ordered_from_supplier_id: i64,
    order_qty: i32,
}

impl From<ComparisonRow> for SavedComparison {
    fn from(row: ComparisonRow) -> Self {
        SavedComparison {
            id: row.id,
            comparison: NewComparison {
                upc: row.upc,
                product_id: row.product_id,
                scanned_at: row.scanned_at,
                scanned_by: row.scanned_by,
                current_cost: row.current_cost,
                current_vendor: row.current_vendor,
                best_supplier_id: row.best_supplier_id,
                best_unit_cost: row.best_unit_cost,
                savings_per_unit: row.savings_per_unit,
                savings_percent: row.savings_percent,
                all_options: row.all_options,
                ordered_from_supplier_id: row.ordered_from_supplier_id,
                order_qty: row.order_qty,
            },
        }
    }
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn records_for_upc(&self, upc: &str) -> RepositoryResult<Vec<PriceRecord>> {
        let rows: Vec<PriceRow> = sqlx::query_as(&format!(
            "SELECT {PRICE_COLUMNS} FROM supplier_prices WHERE upc = $1 ORDER BY supplier_id"
        ))
        .bind(upc)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(rows.into_iter().map(PriceRecord::from).collect())
    }

    async fn list_suppliers(&self, active_only: bool) -> RepositoryResult<Vec<Supplier>> {
        let rows: Vec<SupplierRow> = sqlx::query_as(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE ($1 = FALSE OR is_active) ORDER BY name"
        ))
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(rows.into_iter().map(Supplier::from).collect())
    }

    async fn get_supplier(&self, id: SupplierId) -> RepositoryResult<Option<Supplier>> {
        let row: Option<SupplierRow> =
            sqlx::query_as(&format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(unavailable)?;

        Ok(row.map(Supplier::from))
    }

    async fn list_products(&self, filter: &ProductFilter) -> RepositoryResult<Vec<Product>> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"
        ));

        if let Some(department) = &filter.department {
            query.push(" AND department = ").push_bind(department.clone());
        }
        if let Some(vendor) = &filter.vendor {
            query.push(" AND current_vendor = ").push_bind(vendor.clone());
        }
        if let Some(search) = &filter.search {
            query.push(" AND name ILIKE ").push_bind(format!("%{}%", search));
        }

        query
            .push(" ORDER BY name LIMIT ")
            .push_bind(filter.limit() as i64)
            .push(" OFFSET ")
            .push_bind(filter.offset() as i64);

        let rows: Vec<ProductRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn get_product(&self, id: i64) -> RepositoryResult<Option<Product>> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(unavailable)?;

        Ok(row.map(Product::from))
    }

    async fn get_product_by_upc(&self, upc: &str) -> RepositoryResult<Option<Product>> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE upc = $1"))
                .bind(upc)
                .fetch_optional(&self.pool)
                .await
                .map_err(unavailable)?;

        Ok(row.map(Product::from))
    }

    async fn list_departments(&self) -> RepositoryResult<Vec<String>> {
        sqlx::query_scalar(
            "SELECT DISTINCT department FROM products WHERE department IS NOT NULL ORDER BY department",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)
    }

    async fn list_vendors(&self) -> RepositoryResult<Vec<String>> {
        sqlx::query_scalar(
            "SELECT DISTINCT current_vendor FROM products WHERE current_vendor IS NOT NULL ORDER BY current_vendor",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)
    }

    async fn catalog_stats(&self) -> RepositoryResult<CatalogStats> {
        let (total, with_cost, with_vendor, departments): (i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(current_cost), COUNT(current_vendor), COUNT(DISTINCT department)
            FROM products
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(CatalogStats {
            total_products: total as usize,
            products_with_cost: with_cost as usize,
            products_with_vendor: with_vendor as usize,
            departments: departments as usize,
        })
    }

    async fn supplier_prices(
        &self,
        supplier_id: SupplierId,
        limit: usize,
    ) -> RepositoryResult<Vec<PriceRecord>> {
        let rows: Vec<PriceRow> = sqlx::query_as(&format!(
            "SELECT {PRICE_COLUMNS} FROM supplier_prices WHERE supplier_id = $1 \
             ORDER BY effective_date DESC, upc LIMIT $2"
        ))
        .bind(supplier_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(rows.into_iter().map(PriceRecord::from).collect())
    }

    async fn upsert_price(&self, record: PriceRecord) -> RepositoryResult<PriceRecord> {
        record
            .validate()
            .map_err(|e| RepositoryError::InvalidRecord(e.to_string()))?;

        if self.get_supplier(record.supplier_id).await?.is_none() {
            return Err(RepositoryError::SupplierNotFound(record.supplier_id));
        }

        insert_price(&self.pool, &record).await.map_err(write_error)
    }

    async fn aliases_for_upc(&self, standard_upc: &str) -> RepositoryResult<Vec<UpcAlias>> {
        let rows: Vec<AliasRow> = sqlx::query_as(
            r#"
            SELECT supplier_id, supplier_sku, supplier_name, standard_upc
            FROM upc_aliases WHERE standard_upc = $1 ORDER BY supplier_id, supplier_sku
            "#,
        )
        .bind(standard_upc)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(rows.into_iter().map(UpcAlias::from).collect())
    }

    async fn save_comparison(
        &self,
        comparison: NewComparison,
    ) -> RepositoryResult<SavedComparison> {
        let row: ComparisonRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO best_buy_comparisons (upc, product_id, scanned_at, scanned_by, current_cost,
                current_vendor, best_supplier_id, best_unit_cost, savings_per_unit, savings_percent,
                all_options, action, ordered_from_supplier_id, order_qty)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'saved', $12, $13)
            RETURNING {COMPARISON_COLUMNS}
            "#
        ))
        .bind(&comparison.upc)
        .bind(comparison.product_id)
        .bind(comparison.scanned_at)
        .bind(&comparison.scanned_by)
        .bind(comparison.current_cost)
        .bind(&comparison.current_vendor)
        .bind(comparison.best_supplier_id)
        .bind(comparison.best_unit_cost)
        .bind(comparison.savings_per_unit)
        .bind(comparison.savings_percent)
        .bind(&comparison.all_options)
        .bind(comparison.ordered_from_supplier_id)
        .bind(comparison.order_qty)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)?;

        Ok(row.into())
    }

    async fn recent_comparisons(&self, limit: usize) -> RepositoryResult<Vec<SavedComparison>> {
        let rows: Vec<ComparisonRow> = sqlx::query_as(&format!(
            "SELECT {COMPARISON_COLUMNS} FROM best_buy_comparisons ORDER BY scanned_at DESC, id DESC LIMIT $1"
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(rows.into_iter().map(SavedComparison::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_type_round_trip_through_column() {
        for price_type in [PriceType::List, PriceType::Promo, PriceType::Contract] {
            assert_eq!(parse_price_type(price_type_str(price_type)), price_type);
        }
        assert_eq!(parse_price_type("legacy"), PriceType::List);
    }

    #[test]
    fn test_supplier_row_without_fees_has_no_shipping() {
        let row = SupplierRow {
            id: 1,
            code: "HACKNEY".to_string(),
            name: "HT Hackney".to_string(),
            contact_name: None,
            phone: None,
            email: None,
            min_order_amount: Some(Decimal::new(500, 0)),
            order_lead_days: 2,
            delivery_days: Some("Mon,Wed,Fri".to_string()),
            is_active: true,
            per_case_fee: None,
            flat_fee: None,
            free_shipping_threshold: None,
        };
        assert!(Supplier::from(row).shipping.is_none());
    }

    #[test]
    fn test_write_errors_split_bad_input_from_outage() {
        // numeric_value_out_of_range, string_data_right_truncation, check_violation
        for code in ["22003", "22001", "23514"] {
            assert!(is_rejected_input(code), "{code}");
        }
        // unique_violation, connection_failure
        assert!(!is_rejected_input("23505"));
        assert!(!is_rejected_input("08006"));

        assert!(matches!(
            write_error(sqlx::Error::PoolTimedOut),
            RepositoryError::Unavailable(_)
        ));
    }
}
