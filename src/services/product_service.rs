//! Product Service
//!
//! Inventory for the point of sale. Stock only goes down through confirmed sales.

use sqlx::SqlitePool;
use tracing::info;

use crate::database::is_unique_violation;
use crate::error::{AppError, AppResult};
use crate::models::product::{Product, ProductInput, ProductRow};

const PRODUCT_COLUMNS: &str = "id, name, price_cents, stock, image_url";

#[derive(Clone)]
pub struct ProductService {
    pool: SqlitePool,
}

impl ProductService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn name_taken(name: &str) -> AppError {
        AppError::conflict(format!("A product named '{}' already exists", name))
    }

    pub async fn create(&self, input: &ProductInput) -> AppResult<Product> {
        let product = input.validate()?;

        let result = sqlx::query("INSERT INTO products (name, price_cents, stock, image_url) VALUES (?, ?, ?, ?)")
            .bind(&product.name)
            .bind(product.price_cents)
            .bind(product.stock)
            .bind(&product.image_url)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => {
                let id = done.last_insert_rowid();
                info!(product_id = id, name = %product.name, "Product created");
                self.get(id).await
            }
            Err(err) if is_unique_violation(&err) => Err(Self::name_taken(&product.name)),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn update(&self, id: i64, input: &ProductInput) -> AppResult<Product> {
        let product = input.validate()?;

        let result = sqlx::query(
            "UPDATE products SET name = ?, price_cents = ?, stock = ?, image_url = ? WHERE id = ?",
        )
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(&product.image_url)
        .bind(id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(AppError::not_found("Product")),
            Ok(_) => self.get(id).await,
            Err(err) if is_unique_violation(&err) => Err(Self::name_taken(&product.name)),
            Err(err) => Err(err.into()),
        }
    }

    /// Past sale lines keep their price and show the product as deleted
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let done = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if done.rows_affected() == 0 {
            return Err(AppError::not_found("Product"));
        }
        info!(product_id = id, "Product deleted");
        Ok(())
    }

    pub async fn get(&self, id: i64) -> AppResult<Product> {
        sqlx::query_as::<_, ProductRow>(&format!("SELECT {} FROM products WHERE id = ?", PRODUCT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Product::from)
            .ok_or_else(|| AppError::not_found("Product"))
    }

    pub async fn list(&self) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products ORDER BY name COLLATE NOCASE, id",
            PRODUCT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }
}
