pub mod upc;
pub mod product;
pub mod supplier;
pub mod price;
pub mod pricing;
pub mod stats;
pub mod comparison;

pub use upc::{UpcError, UpcValidation};
pub use product::{CatalogStats, Product, ProductFilter};
pub use supplier::{ShippingTerms, Supplier, SupplierId};
pub use price::{PriceError, PriceRecord, PriceType};
pub use pricing::{
    ComparisonResult, ComparisonStatus, CurrencyAssumption, PriceResolver, PriceWindow,
    ResolveError, ResolverConfig, WindowError, MAX_AGE_HOURS_LIMIT,
};
pub use stats::{landed_cost_per_unit, PriceStatistics};
pub use comparison::{NewComparison, SavedComparison, UpcAlias};
