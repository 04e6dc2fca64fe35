//! Register reconciliation ("cuadre de caja")
//!
//! Sums what the system recorded since the previous closing, split by payment method,
//! and compares the counted drawer against it. Period boundaries are half-open:
//! `[previous closed_at, now)`, so consecutive periods neither overlap nor leave gaps.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, Instrument};

use crate::closing_span;
use crate::database::{begin_takings, from_millis, is_unique_violation, to_millis};
use crate::models::cash_closing::{
    expected_cash, parse_counted_cash, variance, CashClosing, CashClosingRow, ClosingOutcome,
    ClosingPreview, ClosingReport, PeriodTotals, ReconciliationError, SourceSums,
};
use crate::models::money;
use crate::models::operator::Operator;
use crate::models::payment_method::PaymentMethod;
use crate::services::time_provider::TimeProvider;

const CLOSING_SELECT: &str = r#"
    SELECT cc.id, cc.closed_at, cc.period_start,
           cc.system_cash_cents, cc.system_card_cents, cc.system_total_cents,
           cc.counted_cash_cents, cc.variance_cents,
           cc.operator_id, o.username AS operator_username
    FROM cash_closings cc
    LEFT JOIN operators o ON o.id = cc.operator_id
"#;

pub struct ReconciliationService {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
    starting_float: Decimal,
    fallback_period_start: DateTime<Utc>,
    /// Serializes closings within this process; the UNIQUE(period_start) constraint
    /// covers other processes sharing the database file.
    closing_lock: Mutex<()>,
}

impl ReconciliationService {
    pub fn new(
        pool: SqlitePool,
        time_provider: Arc<dyn TimeProvider>,
        starting_float: Decimal,
        fallback_period_start: DateTime<Utc>,
    ) -> Self {
        Self {
            pool,
            time_provider,
            starting_float,
            fallback_period_start,
            closing_lock: Mutex::new(()),
        }
    }

    pub fn starting_float(&self) -> Decimal {
        self.starting_float
    }

    /// Start of the open period: the newest closing's `closed_at`, or the fallback date
    async fn period_start(&self, conn: &mut SqliteConnection) -> Result<DateTime<Utc>, sqlx::Error> {
        let last: Option<i64> = sqlx::query_scalar(
            "SELECT closed_at FROM cash_closings ORDER BY closed_at DESC, id DESC LIMIT 1",
        )
        .fetch_optional(&mut *conn)
        .await?;

        Ok(last.map(from_millis).unwrap_or(self.fallback_period_start))
    }

    /// The four per-source sums over `[start, end)`, each 0 when nothing matched
    async fn source_sums(
        conn: &mut SqliteConnection,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<SourceSums, sqlx::Error> {
        let (product_cash, product_card): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(CASE WHEN payment_method = ? THEN total_cents END), 0),
                   COALESCE(SUM(CASE WHEN payment_method = ? THEN total_cents END), 0)
            FROM sales
            WHERE sold_at >= ? AND sold_at < ?
            "#,
        )
        .bind(PaymentMethod::Cash)
        .bind(PaymentMethod::Card)
        .bind(to_millis(start))
        .bind(to_millis(end))
        .fetch_one(&mut *conn)
        .await?;

        let (membership_cash, membership_card): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(CASE WHEN payment_method = ?
                                THEN service_cost_cents + enrollment_fee_cents END), 0),
                   COALESCE(SUM(CASE WHEN payment_method = ?
                                THEN service_cost_cents + enrollment_fee_cents END), 0)
            FROM memberships
            WHERE paid_at >= ? AND paid_at < ?
            "#,
        )
        .bind(PaymentMethod::Cash)
        .bind(PaymentMethod::Card)
        .bind(to_millis(start))
        .bind(to_millis(end))
        .fetch_one(&mut *conn)
        .await?;

        crate::logging::log_database_operation("SUM", "sales+memberships", None);

        Ok(SourceSums {
            product_cash,
            product_card,
            membership_cash,
            membership_card,
        })
    }

    async fn totals_on(
        &self,
        conn: &mut SqliteConnection,
        now: DateTime<Utc>,
    ) -> Result<PeriodTotals, sqlx::Error> {
        let start = self.period_start(conn).await?;
        let sums = Self::source_sums(conn, start, now).await?;
        Ok(sums.into_totals(start, now))
    }

    /// Takings of the open period up to now
    pub async fn period_totals(&self) -> Result<PeriodTotals, ReconciliationError> {
        let now = self.time_provider.now_millis();
        let mut conn = self.pool.acquire().await?;
        Ok(self.totals_on(&mut conn, now).await?)
    }

    /// Period totals plus the float and the cash the drawer should hold
    pub async fn preview(&self) -> Result<ClosingPreview, ReconciliationError> {
        let totals = self.period_totals().await?;
        Ok(ClosingPreview {
            expected_cash: expected_cash(totals.cash_total, self.starting_float),
            starting_float: self.starting_float,
            totals,
        })
    }

    /// Close the register with the counted cash. The totals are computed and the closing
    /// written in one transaction; nothing is written when validation fails.
    pub async fn close_register(
        &self,
        counted_cash: Option<&Value>,
        operator: &Operator,
    ) -> Result<ClosingReport, ReconciliationError> {
        let counted = parse_counted_cash(counted_cash)?;
        let span = closing_span!(operator.id);
        self.close_with(counted, operator.id).instrument(span).await
    }

    async fn close_with(
        &self,
        counted: Decimal,
        operator_id: i64,
    ) -> Result<ClosingReport, ReconciliationError> {
        let _guard = self.closing_lock.lock().await;
        let mut tx = begin_takings(&self.pool).await?;

        let closed_at = self.time_provider.now_millis();
        let totals = self.totals_on(&mut tx, closed_at).await?;
        tracing::Span::current().record("period_start", totals.period_start.to_rfc3339().as_str());

        if closed_at <= totals.period_start {
            return Err(ReconciliationError::Conflict(format!(
                "the current period starts at {} and cannot be closed at {}",
                totals.period_start.to_rfc3339(),
                closed_at.to_rfc3339()
            )));
        }

        let expected = expected_cash(totals.cash_total, self.starting_float);
        let diff = variance(counted, expected);

        let inserted = sqlx::query(
            r#"
            INSERT INTO cash_closings (
                closed_at, period_start, system_cash_cents, system_card_cents,
                system_total_cents, counted_cash_cents, variance_cents, operator_id
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(to_millis(closed_at))
        .bind(to_millis(totals.period_start))
        .bind(money::to_cents(totals.cash_total, "system_cash")?)
        .bind(money::to_cents(totals.card_total, "system_card")?)
        .bind(money::to_cents(totals.grand_total, "system_total")?)
        .bind(money::to_cents(counted, "counted_cash")?)
        .bind(money::to_cents(diff, "variance")?)
        .bind(operator_id)
        .execute(&mut *tx)
        .await;

        let closing_id = match inserted {
            Ok(result) => result.last_insert_rowid(),
            Err(err) if is_unique_violation(&err) => {
                return Err(ReconciliationError::Conflict(
                    "this period has already been closed".to_string(),
                ))
            }
            Err(err) => return Err(err.into()),
        };

        let closing: CashClosing =
            sqlx::query_as::<_, CashClosingRow>(&format!("{} WHERE cc.id = ?", CLOSING_SELECT))
                .bind(closing_id)
                .fetch_one(&mut *tx)
                .await?
                .into();

        tx.commit().await?;
        tracing::Span::current().record("closing_id", closing_id);
        debug!(closing_id, "Closing committed");

        crate::logging::log_closing(closing_id, expected, counted, diff);

        let outcome = ClosingOutcome::classify(diff);
        Ok(ClosingReport {
            message: outcome.message(diff),
            closing,
            starting_float: self.starting_float,
            expected_cash: expected,
        })
    }

    /// All closings, newest first
    pub async fn history(&self) -> Result<Vec<CashClosing>, ReconciliationError> {
        let rows = sqlx::query_as::<_, CashClosingRow>(&format!(
            "{} ORDER BY cc.closed_at DESC, cc.id DESC",
            CLOSING_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CashClosing::from).collect())
    }
}
