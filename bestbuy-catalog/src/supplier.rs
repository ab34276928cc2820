use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Suppliers are ordered by id when breaking price ties.
pub type SupplierId = i64;

/// Warehouse or distributor quoting wholesale prices
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Supplier {
    pub id: SupplierId,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub min_order_amount: Option<Decimal>,
    #[serde(default = "default_lead_days")]
    pub order_lead_days: i32,
    /// e.g. "Mon,Wed,Fri"
    #[serde(default)]
    pub delivery_days: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub shipping: Option<ShippingTerms>,
}

fn default_lead_days() -> i32 {
    2
}

fn default_active() -> bool {
    true
}

/// Delivery fees used for landed cost
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ShippingTerms {
    pub per_case_fee: Option<Decimal>,
    pub flat_fee: Option<Decimal>,
    pub free_shipping_threshold: Option<Decimal>,
}

impl Supplier {
    pub fn new(id: SupplierId, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            code: code.into(),
            name: name.into(),
            contact_name: None,
            phone: None,
            email: None,
            min_order_amount: None,
            order_lead_days: default_lead_days(),
            delivery_days: None,
            is_active: true,
            shipping: None,
        }
    }

    pub fn with_shipping(mut self, shipping: ShippingTerms) -> Self {
        self.shipping = Some(shipping);
        self
    }
}
