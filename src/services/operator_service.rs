//! Operator Service
//!
//! Registry of the staff members that requests act on behalf of.

use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::info;

use crate::database::{is_unique_violation, to_millis};
use crate::error::{AppError, AppResult};
use crate::models::operator::{Operator, OperatorInput, OperatorRow};
use crate::services::time_provider::TimeProvider;

#[derive(Clone)]
pub struct OperatorService {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl OperatorService {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { pool, time_provider }
    }

    pub async fn create(&self, input: &OperatorInput) -> AppResult<Operator> {
        let username = input.validated_username()?;
        let created_at = self.time_provider.now_millis();

        let result = sqlx::query("INSERT INTO operators (username, role, created_at) VALUES (?, ?, ?)")
            .bind(&username)
            .bind(input.role)
            .bind(to_millis(created_at))
            .execute(&self.pool)
            .await;

        let id = match result {
            Ok(done) => done.last_insert_rowid(),
            Err(err) if is_unique_violation(&err) => {
                return Err(AppError::conflict(format!(
                    "Operator '{}' already exists",
                    username
                )))
            }
            Err(err) => return Err(err.into()),
        };

        info!(operator_id = id, username = %username, "Operator created");
        self.find(id)
            .await?
            .ok_or_else(|| AppError::internal_error("Operator vanished after insert"))
    }

    pub async fn find(&self, id: i64) -> AppResult<Option<Operator>> {
        let row = sqlx::query_as::<_, OperatorRow>(
            "SELECT id, username, role, created_at FROM operators WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Operator::from))
    }

    pub async fn list(&self) -> AppResult<Vec<Operator>> {
        let rows = sqlx::query_as::<_, OperatorRow>(
            "SELECT id, username, role, created_at FROM operators ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Operator::from).collect())
    }
}
