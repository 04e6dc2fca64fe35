//! Statistics Service
//!
//! Read-only aggregates for the dashboard. Date filters are local calendar dates; `to`
//! includes its whole day.

use chrono::{Months, NaiveDate};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::database::to_millis;
use crate::error::{AppError, AppResult};
use crate::models::money;
use crate::models::statistics::{age_distribution, DateRangeQuery, Distribution, MonthlyRevenue, Summary};
use crate::services::time_provider::TimeProvider;
use crate::services::timezone_service::{parse_local_date, GymSchedule, TimezoneError};

/// Longest span the monthly chart will compute
const MAX_MONTHS: usize = 120;

type Bounds = (Option<i64>, Option<i64>);

#[derive(Clone)]
pub struct StatisticsService {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
    schedule: GymSchedule,
}

fn parse_optional_date(value: &Option<String>) -> AppResult<Option<NaiveDate>> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(date) => Ok(Some(parse_local_date(date)?)),
    }
}

impl StatisticsService {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>, schedule: GymSchedule) -> Self {
        Self {
            pool,
            time_provider,
            schedule,
        }
    }

    /// Millisecond bounds `[from, to)` for the query, each open when absent
    fn bounds(&self, range: &DateRangeQuery) -> AppResult<Bounds> {
        let from = parse_optional_date(&range.from)?;
        let to = parse_optional_date(&range.to)?;
        let (start, end) = self.schedule.date_range(from, to)?;
        Ok((start.map(to_millis), end.map(to_millis)))
    }

    async fn sum_cents(&self, sql: &str, (start, end): Bounds) -> AppResult<i64> {
        let cents: i64 = sqlx::query_scalar(sql)
            .bind(start)
            .bind(start)
            .bind(end)
            .bind(end)
            .fetch_one(&self.pool)
            .await?;
        Ok(cents)
    }

    async fn membership_cents(&self, bounds: Bounds) -> AppResult<i64> {
        self.sum_cents(
            r#"
            SELECT COALESCE(SUM(service_cost_cents + enrollment_fee_cents), 0) FROM memberships
            WHERE (? IS NULL OR paid_at >= ?) AND (? IS NULL OR paid_at < ?)
            "#,
            bounds,
        )
        .await
    }

    async fn sales_cents(&self, bounds: Bounds) -> AppResult<i64> {
        self.sum_cents(
            r#"
            SELECT COALESCE(SUM(total_cents), 0) FROM sales
            WHERE (? IS NULL OR sold_at >= ?) AND (? IS NULL OR sold_at < ?)
            "#,
            bounds,
        )
        .await
    }

    pub async fn summary(&self, range: &DateRangeQuery) -> AppResult<Summary> {
        let bounds = self.bounds(range)?;
        let now = to_millis(self.time_provider.now_millis());

        let total_clients: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients")
            .fetch_one(&self.pool)
            .await?;

        let active_memberships: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM memberships WHERE active = 1 AND (ends_at IS NULL OR ends_at >= ?)",
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        let new_clients: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM clients
            WHERE (? IS NULL OR registered_at >= ?) AND (? IS NULL OR registered_at < ?)
            "#,
        )
        .bind(bounds.0)
        .bind(bounds.0)
        .bind(bounds.1)
        .bind(bounds.1)
        .fetch_one(&self.pool)
        .await?;

        let memberships = self.membership_cents(bounds).await?;
        let sales = self.sales_cents(bounds).await?;

        Ok(Summary {
            total_clients,
            active_memberships,
            revenue_total: money::from_cents(memberships + sales),
            revenue_memberships: money::from_cents(memberships),
            revenue_sales: money::from_cents(sales),
            new_clients,
        })
    }

    /// Sales plus membership revenue per local calendar month. Defaults to the twelve
    /// months ending with the current one.
    pub async fn monthly_revenue(&self, range: &DateRangeQuery) -> AppResult<MonthlyRevenue> {
        let today = self.schedule.local_date(self.time_provider.now_millis());
        let to = parse_optional_date(&range.to)?.unwrap_or(today);
        let from = match parse_optional_date(&range.from)? {
            Some(from) => from,
            None => GymSchedule::month_start(to)
                .checked_sub_months(Months::new(11))
                .unwrap_or(to),
        };
        if from > to {
            return Err(TimezoneError::InvertedRange.into());
        }

        let mut labels = Vec::new();
        let mut revenue = Vec::new();
        let mut month = GymSchedule::month_start(from);
        let last = GymSchedule::month_start(to);

        while month <= last {
            if labels.len() >= MAX_MONTHS {
                return Err(AppError::validation(format!(
                    "Monthly revenue covers at most {} months",
                    MAX_MONTHS
                )));
            }
            let next = GymSchedule::next_month(month)
                .ok_or_else(|| AppError::validation("Date range is out of bounds"))?;
            let bounds = (
                Some(to_millis(self.schedule.start_of_local_date(month))),
                Some(to_millis(self.schedule.start_of_local_date(next))),
            );

            let cents = self.membership_cents(bounds).await? + self.sales_cents(bounds).await?;
            labels.push(month.format("%b/%y").to_string());
            revenue.push(format!("{:.2}", money::from_cents(cents)));
            month = next;
        }

        Ok(MonthlyRevenue { labels, revenue })
    }

    /// Ages of the clients registered in the range
    pub async fn age_distribution(&self, range: &DateRangeQuery) -> AppResult<Distribution> {
        let (start, end) = self.bounds(range)?;
        let ages: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT age FROM clients
            WHERE age IS NOT NULL
              AND (? IS NULL OR registered_at >= ?) AND (? IS NULL OR registered_at < ?)
            "#,
        )
        .bind(start)
        .bind(start)
        .bind(end)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(age_distribution(ages))
    }

    /// Current memberships per service type
    pub async fn service_distribution(&self) -> AppResult<Distribution> {
        let now = to_millis(self.time_provider.now_millis());
        let pairs: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT s.service_type, COUNT(*) FROM memberships m
            JOIN services s ON s.id = m.service_id
            WHERE m.active = 1 AND (m.ends_at IS NULL OR m.ends_at >= ?)
            GROUP BY s.service_type
            ORDER BY COUNT(*) DESC, s.service_type
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(Distribution::from_pairs(pairs))
    }

    /// Clients with and without a current membership
    pub async fn client_status(&self) -> AppResult<Distribution> {
        let now = to_millis(self.time_provider.now_millis());
        let (active, inactive): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(is_active), 0), COALESCE(SUM(1 - is_active), 0) FROM (
                SELECT EXISTS (
                    SELECT 1 FROM memberships m
                    WHERE m.client_id = c.id AND m.active = 1
                      AND (m.ends_at IS NULL OR m.ends_at >= ?)
                ) AS is_active
                FROM clients c
            )
            "#,
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(Distribution::from_pairs(vec![
            ("Activos".to_string(), active),
            ("Inactivos".to_string(), inactive),
        ]))
    }

    pub async fn gender_distribution(&self) -> AppResult<Distribution> {
        let pairs: Vec<(String, i64)> =
            sqlx::query_as("SELECT sex, COUNT(*) FROM clients GROUP BY sex ORDER BY sex")
                .fetch_all(&self.pool)
                .await?;

        Ok(Distribution::from_pairs(pairs))
    }
}

