//! Point-of-Sale Model
//!
//! The sale being rung up is a `Cart` held by the terminal and sent with every request.
//! The server re-validates it against current prices and stock each time.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::money::{self, serde_two_places};
use super::payment_method::PaymentMethod;
use crate::database::from_millis;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("There are no products in the sale")]
    Empty,

    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),

    #[error("There is no line {0} in the sale")]
    NoSuchLine(usize),

    #[error("Product {0} not found")]
    ProductNotFound(i64),

    #[error("Not enough stock for {product}: {available} available, {requested} requested")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Quantity already in the cart for a product
    pub fn quantity_of(&self, product_id: i64) -> i64 {
        self.lines
            .iter()
            .filter(|line| line.product_id == product_id)
            .map(|line| line.quantity)
            .sum()
    }

    /// Add units of a product, merging into an existing line. The merged quantity may
    /// not exceed `available` stock.
    pub fn add(
        &mut self,
        product_id: i64,
        product_name: &str,
        quantity: i64,
        available: i64,
    ) -> Result<(), CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        let requested = self.quantity_of(product_id) + quantity;
        if requested > available {
            return Err(CartError::InsufficientStock {
                product: product_name.to_string(),
                available,
                requested,
            });
        }

        match self.lines.iter_mut().find(|line| line.product_id == product_id) {
            Some(line) => line.quantity += quantity,
            None => self.lines.push(CartLine {
                product_id,
                quantity,
            }),
        }
        Ok(())
    }

    /// Remove a line by its position
    pub fn remove(&mut self, index: usize) -> Result<CartLine, CartError> {
        if index >= self.lines.len() {
            return Err(CartError::NoSuchLine(index));
        }
        Ok(self.lines.remove(index))
    }

    /// Lines with duplicates merged, in first-seen order.
    /// Fails on an empty cart or any quantity below 1.
    pub fn normalized(&self) -> Result<Vec<CartLine>, CartError> {
        if self.lines.is_empty() {
            return Err(CartError::Empty);
        }

        let mut merged: Vec<CartLine> = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            if line.quantity < 1 {
                return Err(CartError::InvalidQuantity(line.quantity));
            }
            match merged.iter_mut().find(|m| m.product_id == line.product_id) {
                Some(existing) => existing.quantity += line.quantity,
                None => merged.push(*line),
            }
        }
        Ok(merged)
    }
}

/// A cart line priced at current catalog prices
#[derive(Debug, Clone, Serialize)]
pub struct QuoteLine {
    pub product_id: i64,
    pub name: String,
    pub quantity: i64,
    #[serde(with = "serde_two_places")]
    pub unit_price: Decimal,
    #[serde(with = "serde_two_places")]
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub cart: Cart,
    pub lines: Vec<QuoteLine>,
    #[serde(with = "serde_two_places")]
    pub total: Decimal,
}

impl Quote {
    pub fn new(cart: Cart, lines: Vec<QuoteLine>) -> Self {
        let total = lines.iter().map(|line| line.subtotal).sum();
        Self { cart, lines, total }
    }
}

/// Confirm payload: the cart plus how it was paid
#[derive(Debug, Clone, Deserialize)]
pub struct SaleRequest {
    #[serde(default)]
    pub lines: Vec<CartLine>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl SaleRequest {
    pub fn cart(&self) -> Cart {
        Cart {
            lines: self.lines.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddToCart {
    #[serde(default)]
    pub cart: Cart,
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoveFromCart {
    #[serde(default)]
    pub cart: Cart,
    pub index: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Sale {
    pub id: i64,
    pub sold_at: DateTime<Utc>,
    #[serde(with = "serde_two_places")]
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub operator_id: Option<i64>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct SaleRow {
    pub id: i64,
    pub sold_at: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub operator_id: Option<i64>,
}

impl From<SaleRow> for Sale {
    fn from(row: SaleRow) -> Self {
        Self {
            id: row.id,
            sold_at: from_millis(row.sold_at),
            total: money::from_cents(row.total_cents),
            payment_method: row.payment_method,
            operator_id: row.operator_id,
        }
    }
}

/// Name shown on receipts for lines whose product was deleted since the sale
pub const DELETED_PRODUCT: &str = "Producto eliminado";

#[derive(Debug, Clone, Serialize)]
pub struct ReceiptLine {
    pub product_id: Option<i64>,
    pub name: String,
    pub quantity: i64,
    #[serde(with = "serde_two_places")]
    pub unit_price: Decimal,
    #[serde(with = "serde_two_places")]
    pub subtotal: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ReceiptLineRow {
    pub product_id: Option<i64>,
    pub name: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl From<ReceiptLineRow> for ReceiptLine {
    fn from(row: ReceiptLineRow) -> Self {
        let unit_price = money::from_cents(row.unit_price_cents);
        Self {
            product_id: row.product_id,
            name: row.name.unwrap_or_else(|| DELETED_PRODUCT.to_string()),
            quantity: row.quantity,
            unit_price,
            subtotal: unit_price * Decimal::from(row.quantity),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    #[serde(flatten)]
    pub sale: Sale,
    pub lines: Vec<ReceiptLine>,
}
