//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::money::{self, serde_two_places};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(with = "serde_two_places")]
    pub price: Decimal,
    pub stock: i64,
    pub image_url: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
    pub image_url: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            price: money::from_cents(row.price_cents),
            stock: row.stock,
            image_url: row.image_url,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductInput {
    #[serde(default)]
    pub name: String,
    pub price: Option<Value>,
    pub stock: Option<Value>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidProduct {
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
    pub image_url: Option<String>,
}

fn parse_stock(value: Option<&Value>) -> Result<i64, AppError> {
    let stock = match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match stock {
        Some(stock) if stock >= 0 => Ok(stock),
        Some(_) => Err(AppError::validation("stock cannot be negative")),
        None => Err(AppError::validation("stock must be a whole number")),
    }
}

impl ProductInput {
    pub fn validate(&self) -> Result<ValidProduct, AppError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Product name is required"));
        }

        let price = money::parse_positive(self.price.as_ref(), "price")?;

        Ok(ValidProduct {
            name: name.to_string(),
            price_cents: money::to_cents(price, "price")?,
            stock: parse_stock(self.stock.as_ref())?,
            image_url: self
                .image_url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string),
        })
    }
}
