//! Service catalog: what memberships can be bought and for how much

use sqlx::SqlitePool;
use tracing::info;

use crate::database::is_foreign_key_violation;
use crate::error::{AppError, AppResult};
use crate::models::service::{Service, ServiceInput, ServiceRow};

#[derive(Clone)]
pub struct CatalogService {
    pool: SqlitePool,
}

impl CatalogService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn in_use() -> AppError {
        AppError::conflict("The service has memberships on record and cannot be deleted")
    }

    pub async fn create(&self, input: &ServiceInput) -> AppResult<Service> {
        let service = input.validate()?;

        let id = sqlx::query("INSERT INTO services (name, service_type, cost_cents) VALUES (?, ?, ?)")
            .bind(&service.name)
            .bind(service.service_type)
            .bind(service.cost_cents)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        info!(service_id = id, service_type = %service.service_type, "Service created");
        self.get(id).await
    }

    pub async fn update(&self, id: i64, input: &ServiceInput) -> AppResult<Service> {
        let service = input.validate()?;

        let done = sqlx::query("UPDATE services SET name = ?, service_type = ?, cost_cents = ? WHERE id = ?")
            .bind(&service.name)
            .bind(service.service_type)
            .bind(service.cost_cents)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if done.rows_affected() == 0 {
            return Err(AppError::not_found("Service"));
        }
        self.get(id).await
    }

    /// Services with memberships on record cannot be deleted
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let referenced: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM memberships WHERE service_id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if referenced > 0 {
            return Err(Self::in_use());
        }

        let result = sqlx::query("DELETE FROM services WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(AppError::not_found("Service")),
            Ok(_) => {
                info!(service_id = id, "Service deleted");
                Ok(())
            }
            Err(err) if is_foreign_key_violation(&err) => Err(Self::in_use()),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn get(&self, id: i64) -> AppResult<Service> {
        sqlx::query_as::<_, ServiceRow>(
            "SELECT id, name, service_type, cost_cents FROM services WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Service::from)
        .ok_or_else(|| AppError::not_found("Service"))
    }

    pub async fn list(&self) -> AppResult<Vec<Service>> {
        let rows = sqlx::query_as::<_, ServiceRow>(
            "SELECT id, name, service_type, cost_cents FROM services ORDER BY name COLLATE NOCASE, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Service::from).collect())
    }
}
