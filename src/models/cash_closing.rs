//! Cash Closing Model
//!
//! A closing ("cuadre de caja") compares the cash physically counted in the register
//! with what the system expects: cash takings since the previous closing plus the
//! starting float. Closings are append-only; the newest one's `closed_at` is where the
//! next period starts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::money::{self, serde_two_places, MoneyError};
use crate::database::from_millis;

#[derive(Debug, Error)]
pub enum ReconciliationError {
    /// Counted amount missing, non-numeric or negative. Nothing was written.
    #[error("Invalid counted cash: {0}")]
    InvalidInput(String),

    /// Another closing already covers this period, or the clock is behind it
    #[error("Register closing conflict: {0}")]
    Conflict(String),

    /// The closing could not be stored and was rolled back
    #[error("Failed to record the closing: {0}")]
    PersistenceFailure(#[from] sqlx::Error),
}

impl From<MoneyError> for ReconciliationError {
    fn from(err: MoneyError) -> Self {
        ReconciliationError::InvalidInput(err.to_string())
    }
}

/// Sales and membership payments in `[period_start, period_end)`, split by payment method
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodTotals {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    #[serde(with = "serde_two_places")]
    pub product_cash: Decimal,
    #[serde(with = "serde_two_places")]
    pub product_card: Decimal,
    #[serde(with = "serde_two_places")]
    pub membership_cash: Decimal,
    #[serde(with = "serde_two_places")]
    pub membership_card: Decimal,
    #[serde(with = "serde_two_places")]
    pub cash_total: Decimal,
    #[serde(with = "serde_two_places")]
    pub card_total: Decimal,
    #[serde(with = "serde_two_places")]
    pub grand_total: Decimal,
}

/// Raw per-source sums in cents, before the derived totals are computed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceSums {
    pub product_cash: i64,
    pub product_card: i64,
    pub membership_cash: i64,
    pub membership_card: i64,
}

impl SourceSums {
    pub fn cash_cents(&self) -> i64 {
        self.product_cash + self.membership_cash
    }

    pub fn card_cents(&self) -> i64 {
        self.product_card + self.membership_card
    }

    pub fn into_totals(self, period_start: DateTime<Utc>, period_end: DateTime<Utc>) -> PeriodTotals {
        let cash_total = money::from_cents(self.cash_cents());
        let card_total = money::from_cents(self.card_cents());
        PeriodTotals {
            period_start,
            period_end,
            product_cash: money::from_cents(self.product_cash),
            product_card: money::from_cents(self.product_card),
            membership_cash: money::from_cents(self.membership_cash),
            membership_card: money::from_cents(self.membership_card),
            cash_total,
            card_total,
            grand_total: cash_total + card_total,
        }
    }
}

/// What the operator sees before counting the drawer
#[derive(Debug, Clone, Serialize)]
pub struct ClosingPreview {
    #[serde(flatten)]
    pub totals: PeriodTotals,
    #[serde(with = "serde_two_places")]
    pub starting_float: Decimal,
    #[serde(with = "serde_two_places")]
    pub expected_cash: Decimal,
}

/// Cash the register should hold: cash takings plus the float
pub fn expected_cash(cash_total: Decimal, starting_float: Decimal) -> Decimal {
    cash_total + starting_float
}

/// Signed difference between counted and expected cash
pub fn variance(counted: Decimal, expected: Decimal) -> Decimal {
    counted - expected
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosingOutcome {
    Exact,
    Surplus,
    Shortage,
}

impl ClosingOutcome {
    pub fn classify(variance: Decimal) -> Self {
        if variance.is_zero() {
            ClosingOutcome::Exact
        } else if variance.is_sign_positive() {
            ClosingOutcome::Surplus
        } else {
            ClosingOutcome::Shortage
        }
    }

    pub fn message(&self, variance: Decimal) -> String {
        match self {
            ClosingOutcome::Exact => "Cierre de caja exitoso. Cifras perfectas.".to_string(),
            ClosingOutcome::Surplus => {
                format!("Cierre de caja con sobrante de ${:.2}. Revisar.", variance.abs())
            }
            ClosingOutcome::Shortage => {
                format!("Cierre de caja con faltante de ${:.2}. Revisar urgente.", variance.abs())
            }
        }
    }
}

/// Parse the counted cash the operator typed. Must be a non-negative number.
pub fn parse_counted_cash(value: Option<&Value>) -> Result<Decimal, ReconciliationError> {
    Ok(money::parse_non_negative(value, "counted_cash")?)
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloseRegisterRequest {
    pub counted_cash: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CashClosing {
    pub id: i64,
    pub closed_at: DateTime<Utc>,
    pub period_start: DateTime<Utc>,
    #[serde(with = "serde_two_places")]
    pub system_cash: Decimal,
    #[serde(with = "serde_two_places")]
    pub system_card: Decimal,
    #[serde(with = "serde_two_places")]
    pub system_total: Decimal,
    #[serde(with = "serde_two_places")]
    pub counted_cash: Decimal,
    #[serde(with = "serde_two_places")]
    pub variance: Decimal,
    pub outcome: ClosingOutcome,
    pub operator_id: Option<i64>,
    pub operator_username: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct CashClosingRow {
    pub id: i64,
    pub closed_at: i64,
    pub period_start: i64,
    pub system_cash_cents: i64,
    pub system_card_cents: i64,
    pub system_total_cents: i64,
    pub counted_cash_cents: i64,
    pub variance_cents: i64,
    pub operator_id: Option<i64>,
    pub operator_username: Option<String>,
}

impl From<CashClosingRow> for CashClosing {
    fn from(row: CashClosingRow) -> Self {
        let variance = money::from_cents(row.variance_cents);
        Self {
            id: row.id,
            closed_at: from_millis(row.closed_at),
            period_start: from_millis(row.period_start),
            system_cash: money::from_cents(row.system_cash_cents),
            system_card: money::from_cents(row.system_card_cents),
            system_total: money::from_cents(row.system_total_cents),
            counted_cash: money::from_cents(row.counted_cash_cents),
            variance,
            outcome: ClosingOutcome::classify(variance),
            operator_id: row.operator_id,
            operator_username: row.operator_username,
        }
    }
}

/// Response to a successful close
#[derive(Debug, Clone, Serialize)]
pub struct ClosingReport {
    pub closing: CashClosing,
    #[serde(with = "serde_two_places")]
    pub starting_float: Decimal,
    #[serde(with = "serde_two_places")]
    pub expected_cash: Decimal,
    pub message: String,
}
