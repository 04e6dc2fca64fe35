//! Point-of-Sale Service
//!
//! Carts are priced against the live catalog on every call. Confirming a cart writes the
//! sale, its lines and the stock decrements in one transaction.

use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;

use crate::database::{begin_takings, contains_pattern, to_millis};
use crate::error::{AppError, AppResult};
use crate::models::money;
use crate::models::operator::Operator;
use crate::models::product::{Product, ProductRow};
use crate::models::sale::{
    AddToCart, Cart, CartError, CartLine, Quote, QuoteLine, Receipt, ReceiptLine, ReceiptLineRow,
    RemoveFromCart, Sale, SaleRequest, SaleRow,
};
use crate::services::time_provider::TimeProvider;

#[derive(Clone)]
pub struct SalesService {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SalesService {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { pool, time_provider }
    }

    async fn product(conn: &mut SqliteConnection, id: i64) -> Result<Product, AppError> {
        sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, price_cents, stock, image_url FROM products WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .map(Product::from)
        .ok_or_else(|| CartError::ProductNotFound(id).into())
    }

    /// Price merged cart lines, checking each against current stock
    async fn price_lines(conn: &mut SqliteConnection, lines: &[CartLine]) -> AppResult<Vec<QuoteLine>> {
        let mut priced = Vec::with_capacity(lines.len());
        for line in lines {
            let product = Self::product(conn, line.product_id).await?;
            if line.quantity > product.stock {
                return Err(CartError::InsufficientStock {
                    product: product.name,
                    available: product.stock,
                    requested: line.quantity,
                }
                .into());
            }
            priced.push(QuoteLine {
                product_id: product.id,
                subtotal: product.price * Decimal::from(line.quantity),
                unit_price: product.price,
                quantity: line.quantity,
                name: product.name,
            });
        }
        Ok(priced)
    }

    /// Price a cart without writing anything. An empty cart quotes to zero.
    pub async fn quote(&self, cart: Cart) -> AppResult<Quote> {
        if cart.is_empty() {
            return Ok(Quote::new(cart, Vec::new()));
        }
        let lines = cart.normalized()?;
        let mut conn = self.pool.acquire().await?;
        let priced = Self::price_lines(&mut conn, &lines).await?;
        Ok(Quote::new(Cart { lines }, priced))
    }

    pub async fn add_to_cart(&self, request: AddToCart) -> AppResult<Quote> {
        let mut cart = request.cart;
        let product = {
            let mut conn = self.pool.acquire().await?;
            Self::product(&mut conn, request.product_id).await?
        };
        cart.add(product.id, &product.name, request.quantity, product.stock)?;
        self.quote(cart).await
    }

    pub async fn remove_from_cart(&self, request: RemoveFromCart) -> AppResult<Quote> {
        let mut cart = request.cart;
        cart.remove(request.index)?;
        self.quote(cart).await
    }

    /// Record the sale and take its units out of stock
    pub async fn confirm(&self, request: &SaleRequest, operator: &Operator) -> AppResult<Receipt> {
        let lines = request.cart().normalized()?;
        let mut tx = begin_takings(&self.pool).await?;
        let sold_at = self.time_provider.now_millis();

        let priced = Self::price_lines(&mut tx, &lines).await?;
        let total: Decimal = priced.iter().map(|line| line.subtotal).sum();

        let sale_id = sqlx::query(
            "INSERT INTO sales (sold_at, total_cents, payment_method, operator_id) VALUES (?, ?, ?, ?)",
        )
        .bind(to_millis(sold_at))
        .bind(money::to_cents(total, "total")?)
        .bind(request.payment_method)
        .bind(operator.id)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for line in &priced {
            sqlx::query(
                "INSERT INTO sale_items (sale_id, product_id, quantity, unit_price_cents) VALUES (?, ?, ?, ?)",
            )
            .bind(sale_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(money::to_cents(line.unit_price, "unit_price")?)
            .execute(&mut *tx)
            .await?;

            // Guarded decrement: a concurrent sale may have taken the units since pricing
            let taken = sqlx::query("UPDATE products SET stock = stock - ? WHERE id = ? AND stock >= ?")
                .bind(line.quantity)
                .bind(line.product_id)
                .bind(line.quantity)
                .execute(&mut *tx)
                .await?
                .rows_affected();
            if taken == 0 {
                return Err(CartError::InsufficientStock {
                    product: line.name.clone(),
                    available: 0,
                    requested: line.quantity,
                }
                .into());
            }
        }

        let receipt = Self::fetch_receipt(&mut tx, sale_id)
            .await?
            .ok_or_else(|| AppError::internal_error("Sale vanished after insert"))?;
        tx.commit().await?;

        crate::logging::log_sale_completed(
            sale_id,
            total,
            request.payment_method.as_str(),
            priced.len(),
        );
        Ok(receipt)
    }

    async fn fetch_receipt(conn: &mut SqliteConnection, id: i64) -> Result<Option<Receipt>, sqlx::Error> {
        let Some(sale) = sqlx::query_as::<_, SaleRow>(
            "SELECT id, sold_at, total_cents, payment_method, operator_id FROM sales WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, ReceiptLineRow>(
            r#"
            SELECT si.product_id, p.name, si.quantity, si.unit_price_cents
            FROM sale_items si
            LEFT JOIN products p ON p.id = si.product_id
            WHERE si.sale_id = ?
            ORDER BY si.id
            "#,
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(Some(Receipt {
            sale: sale.into(),
            lines: lines.into_iter().map(ReceiptLine::from).collect(),
        }))
    }

    pub async fn receipt(&self, id: i64) -> AppResult<Receipt> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_receipt(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::not_found("Sale"))
    }

    /// First product whose name contains the query, if any
    pub async fn search_product(&self, query: &str) -> AppResult<Option<Product>> {
        if query.trim().is_empty() {
            return Ok(None);
        }

        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, price_cents, stock, image_url FROM products
            WHERE lower(name) LIKE ? ESCAPE '\'
            ORDER BY name COLLATE NOCASE, id
            LIMIT 1
            "#,
        )
        .bind(contains_pattern(query))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Every sale, newest first
    pub async fn history(&self) -> AppResult<Vec<Sale>> {
        let rows = sqlx::query_as::<_, SaleRow>(
            "SELECT id, sold_at, total_cents, payment_method, operator_id FROM sales ORDER BY sold_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Sale::from).collect())
    }
}
