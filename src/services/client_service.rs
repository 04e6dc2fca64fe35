//! Client Service
//!
//! Registration, contact updates and lookups. A client's status is derived from their
//! memberships at query time, never stored.

use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::info;

use crate::database::{contains_pattern, is_unique_violation, to_millis};
use crate::error::{AppError, AppResult};
use crate::models::client::{
    Client, ClientDetail, ClientInput, ClientRow, ClientStatus, ClientStatusRow, ClientSummary,
    ClientUpdate, CurrentService,
};
use crate::models::membership::{is_current, Membership, MembershipRow, MEMBERSHIP_SELECT};
use crate::services::time_provider::TimeProvider;

const CLIENT_COLUMNS: &str =
    "c.id, c.name, c.email, c.phone, c.sex, c.address, c.emergency_phone, c.age, c.registered_at";

/// Autocomplete result cap
const SEARCH_LIMIT: i64 = 10;

#[derive(Clone)]
pub struct ClientService {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl ClientService {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { pool, time_provider }
    }

    fn email_taken(email: &str) -> AppError {
        AppError::conflict(format!("A client with email '{}' already exists", email))
    }

    pub async fn create(&self, input: &ClientInput) -> AppResult<Client> {
        let client = input.validate()?;
        let registered_at = self.time_provider.now_millis();

        let result = sqlx::query(
            r#"
            INSERT INTO clients (name, email, phone, sex, address, emergency_phone, age, registered_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&client.name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(client.sex)
        .bind(&client.address)
        .bind(&client.emergency_phone)
        .bind(client.age)
        .bind(to_millis(registered_at))
        .execute(&self.pool)
        .await;

        let id = match result {
            Ok(done) => done.last_insert_rowid(),
            Err(err) if is_unique_violation(&err) => return Err(Self::email_taken(&client.email)),
            Err(err) => return Err(err.into()),
        };

        info!(client_id = id, "Client registered");
        self.get(id).await
    }

    pub async fn update(&self, id: i64, update: &ClientUpdate) -> AppResult<Client> {
        let change = update.validate()?;

        let result = sqlx::query(
            r#"
            UPDATE clients
            SET name = ?, email = ?, phone = ?, address = ?, emergency_phone = ?
            WHERE id = ?
            "#,
        )
        .bind(&change.name)
        .bind(&change.email)
        .bind(&change.phone)
        .bind(&change.address)
        .bind(&change.emergency_phone)
        .bind(id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(AppError::not_found("Client")),
            Ok(_) => self.get(id).await,
            Err(err) if is_unique_violation(&err) => Err(Self::email_taken(&change.email)),
            Err(err) => Err(err.into()),
        }
    }

    /// Memberships and attendances keep their rows with the client cleared
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let done = sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if done.rows_affected() == 0 {
            return Err(AppError::not_found("Client"));
        }
        info!(client_id = id, "Client deleted");
        Ok(())
    }

    pub async fn get(&self, id: i64) -> AppResult<Client> {
        sqlx::query_as::<_, ClientRow>(&format!("SELECT {} FROM clients c WHERE c.id = ?", CLIENT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Client::from)
            .ok_or_else(|| AppError::not_found("Client"))
    }

    /// All clients by name, each with its derived status
    pub async fn list(&self) -> AppResult<Vec<ClientSummary>> {
        let now = self.time_provider.now_millis();
        let rows = sqlx::query_as::<_, ClientStatusRow>(&format!(
            r#"
            SELECT {},
                   EXISTS (
                       SELECT 1 FROM memberships m
                       WHERE m.client_id = c.id AND m.active = 1
                         AND (m.ends_at IS NULL OR m.ends_at >= ?)
                   ) AS is_active
            FROM clients c
            ORDER BY c.name COLLATE NOCASE, c.id
            "#,
            CLIENT_COLUMNS
        ))
        .bind(to_millis(now))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ClientSummary::from).collect())
    }

    /// Client with current service and membership history, newest payment first
    pub async fn detail(&self, id: i64) -> AppResult<ClientDetail> {
        let client = self.get(id).await?;
        let now = self.time_provider.now_millis();

        let memberships: Vec<Membership> = sqlx::query_as::<_, MembershipRow>(&format!(
            "{} WHERE m.client_id = ? ORDER BY m.paid_at DESC, m.id DESC",
            MEMBERSHIP_SELECT
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Membership::from)
        .collect();

        let current_service = memberships
            .iter()
            .find(|m| is_current(m.active, m.ends_at, now))
            .map(|m| CurrentService {
                service_name: m.service_name.clone(),
                service_type: m.service_type,
                ends_at: m.ends_at,
            });

        Ok(ClientDetail {
            client,
            status: ClientStatus::from_active(current_service.is_some()),
            current_service,
            memberships,
        })
    }

    /// Autocomplete: name or email containing `q`, or the id equal to it
    pub async fn search(&self, q: &str) -> AppResult<Vec<Client>> {
        let q = q.trim();
        if q.is_empty() {
            return Ok(Vec::new());
        }

        let pattern = contains_pattern(q);
        let id = q.parse::<i64>().unwrap_or(-1);
        let rows = sqlx::query_as::<_, ClientRow>(&format!(
            r#"
            SELECT {} FROM clients c
            WHERE c.id = ?
               OR lower(c.name) LIKE ? ESCAPE '\'
               OR lower(c.email) LIKE ? ESCAPE '\'
            ORDER BY c.name COLLATE NOCASE, c.id
            LIMIT ?
            "#,
            CLIENT_COLUMNS
        ))
        .bind(id)
        .bind(&pattern)
        .bind(&pattern)
        .bind(SEARCH_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Client::from).collect())
    }
}
