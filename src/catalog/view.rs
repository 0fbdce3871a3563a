//! View-facing product representation.
//!
//! What the catalog HTTP surface sends and accepts. Conversions to and from
//! the wire types live here so neither side knows about the other's shape.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::model::{Product, ProductInput, StockStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductView {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Price rendered with two decimals, for display only.
    #[serde(skip_deserializing)]
    pub price_display: String,
    pub stock_status: String,
    pub stock_level: u32,
    pub in_stock: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub category_id: i64,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        let in_stock = product.stock_level > 0 && product.stock_status != StockStatus::OutOfStock;
        Self {
            id: product.id,
            price_display: format!("{:.2}", product.price),
            price: product.price,
            stock_status: String::from(product.stock_status),
            stock_level: product.stock_level,
            in_stock,
            last_updated: Some(product.last_updated),
            category_id: product.category_id,
            name: product.name,
            description: product.description,
        }
    }
}

impl ProductView {
    /// Wire input for a create; a missing timestamp means "now".
    pub fn into_input(self) -> ProductInput {
        ProductInput {
            name: self.name,
            description: self.description,
            price: self.price,
            stock_status: StockStatus::from(self.stock_status.as_str()),
            stock_level: self.stock_level,
            last_updated: self.last_updated.unwrap_or_else(Utc::now),
            category_id: self.category_id,
        }
    }
}
