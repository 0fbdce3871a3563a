//! Wire-facing product types.
//!
//! These mirror the JSON the Products API speaks: camelCase field names,
//! price as a JSON number, and tolerance for omitted or null fields.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog::error::{CatalogError, CatalogResult};

/// Stock availability label.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum StockStatus {
    #[default]
    Unspecified,
    InStock,
    OutOfStock,
    LowStock,
    /// Any label the upstream uses that is not one of the above.
    Other(String),
}

impl StockStatus {
    pub fn label(&self) -> &str {
        match self {
            StockStatus::Unspecified => "",
            StockStatus::InStock => "In Stock",
            StockStatus::OutOfStock => "Out of Stock",
            StockStatus::LowStock => "Low Stock",
            StockStatus::Other(label) => label,
        }
    }
}

impl From<&str> for StockStatus {
    fn from(label: &str) -> Self {
        match label {
            "" => StockStatus::Unspecified,
            "In Stock" => StockStatus::InStock,
            "Out of Stock" => StockStatus::OutOfStock,
            "Low Stock" => StockStatus::LowStock,
            other => StockStatus::Other(other.to_string()),
        }
    }
}

impl From<Option<String>> for StockStatus {
    fn from(label: Option<String>) -> Self {
        label.as_deref().map(StockStatus::from).unwrap_or_default()
    }
}

impl From<StockStatus> for String {
    fn from(status: StockStatus) -> Self {
        match status {
            StockStatus::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

/// A product as owned by the upstream Products API.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    /// Assigned upstream; zero before creation.
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock_status: StockStatus,
    pub stock_level: u32,
    #[serde(with = "timestamp")]
    pub last_updated: DateTime<Utc>,
    pub category_id: i64,
}

impl Product {
    /// The creatable part of this product.
    pub fn to_input(&self) -> ProductInput {
        ProductInput {
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            stock_status: self.stock_status.clone(),
            stock_level: self.stock_level,
            last_updated: self.last_updated,
            category_id: self.category_id,
        }
    }
}

/// Body of a create request: every product field except the id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductInput {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock_status: StockStatus,
    pub stock_level: u32,
    #[serde(with = "timestamp")]
    pub last_updated: DateTime<Utc>,
    pub category_id: i64,
}

impl ProductInput {
    /// Reject input the upstream would refuse anyway.
    pub fn validate(&self) -> CatalogResult<()> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::Validation("name is required".into()));
        }
        if self.price < Decimal::ZERO {
            return Err(CatalogError::Validation(format!(
                "price must not be negative, got {}",
                self.price
            )));
        }
        Ok(())
    }

    /// Attach an id, as the store does on creation.
    pub fn into_product(self, id: i64) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            stock_status: self.stock_status,
            stock_level: self.stock_level,
            last_updated: self.last_updated,
            category_id: self.category_id,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// RFC 3339 on the way out; RFC 3339 or offset-less ISO 8601 (read as UTC)
/// on the way in.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(DateTime::<Utc>::default());
        };
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", raw)))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
            return Some(with_offset.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    }
}
