//! Attendance Service
//!
//! Door check-ins. The checks run in a fixed order: opening hours, client, membership,
//! then today's duplicate.

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::database::to_millis;
use crate::error::AppResult;
use crate::models::attendance::{
    parse_entry, AccessCheck, Attendance, AttendanceRow, CheckInClient, CheckInRefusal,
};
use crate::services::time_provider::TimeProvider;
use crate::services::timezone_service::GymSchedule;

#[derive(Clone)]
pub struct AttendanceService {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
    schedule: GymSchedule,
}

/// Outcome of running the gate checks
enum Gate {
    Open(CheckInClient),
    Refused(CheckInRefusal),
}

impl AttendanceService {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>, schedule: GymSchedule) -> Self {
        Self {
            pool,
            time_provider,
            schedule,
        }
    }

    async fn evaluate(&self, entry: &str) -> AppResult<Gate> {
        let now = self.time_provider.now_millis();

        if !self.schedule.is_open(now) {
            return Ok(Gate::Refused(CheckInRefusal::Closed {
                opening: self.schedule.opening(),
                closing: self.schedule.closing(),
            }));
        }

        let unknown = || {
            Gate::Refused(CheckInRefusal::UnknownClient {
                entry: entry.trim().to_string(),
            })
        };
        let Some(client_id) = parse_entry(entry) else {
            return Ok(unknown());
        };

        let client: Option<(i64, String)> = sqlx::query_as("SELECT id, name FROM clients WHERE id = ?")
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some((id, name)) = client else {
            return Ok(unknown());
        };

        let has_membership: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM memberships
                WHERE client_id = ? AND active = 1 AND (ends_at IS NULL OR ends_at >= ?)
            )
            "#,
        )
        .bind(id)
        .bind(to_millis(now))
        .fetch_one(&self.pool)
        .await?;
        if !has_membership {
            return Ok(Gate::Refused(CheckInRefusal::NoActiveMembership { name }));
        }

        let already_in: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM attendances WHERE client_id = ? AND checked_in_at >= ?)",
        )
        .bind(id)
        .bind(to_millis(self.schedule.local_day_start(now)))
        .fetch_one(&self.pool)
        .await?;
        if already_in {
            return Ok(Gate::Refused(CheckInRefusal::AlreadyCheckedIn { name }));
        }

        Ok(Gate::Open(CheckInClient { id, name }))
    }

    /// Run the checks and record the attendance
    pub async fn check_in(&self, entry: &str) -> AppResult<Attendance> {
        let client = match self.evaluate(entry).await? {
            Gate::Open(client) => client,
            Gate::Refused(refusal) => {
                crate::logging::log_check_in(entry, false, refusal.reason());
                return Err(refusal.into());
            }
        };

        let checked_in_at = self.time_provider.now_millis();
        let id = sqlx::query("INSERT INTO attendances (client_id, checked_in_at) VALUES (?, ?)")
            .bind(client.id)
            .bind(to_millis(checked_in_at))
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        crate::logging::log_check_in(entry, true, "");
        Ok(Attendance {
            id,
            client_id: Some(client.id),
            client_name: Some(client.name),
            checked_in_at,
        })
    }

    /// Same checks as a check-in, without recording anything
    pub async fn validate(&self, entry: &str) -> AppResult<AccessCheck> {
        Ok(match self.evaluate(entry).await? {
            Gate::Open(client) => AccessCheck::granted(client),
            Gate::Refused(refusal) => AccessCheck::refused(&refusal),
        })
    }

    /// All check-ins, newest first
    pub async fn history(&self) -> AppResult<Vec<Attendance>> {
        let rows = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT a.id, a.client_id, c.name AS client_name, a.checked_in_at
            FROM attendances a
            LEFT JOIN clients c ON c.id = a.client_id
            ORDER BY a.checked_in_at DESC, a.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Attendance::from).collect())
    }
}
