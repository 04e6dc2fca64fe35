//! Membership Payment Model
//!
//! A membership is one paid period of a service for a client. The payment is recorded
//! at `paid_at`, which is what the register reconciliation counts.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::money::{self, serde_two_places};
use super::payment_method::PaymentMethod;
use super::service::ServiceType;
use crate::database::from_millis;
use crate::error::AppError;

/// Membership joined with its client and service, as shown on lists and receipts
#[derive(Debug, Clone, Serialize)]
pub struct Membership {
    pub id: i64,
    pub client_id: Option<i64>,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub service_id: i64,
    pub service_name: String,
    pub service_type: ServiceType,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub active: bool,
    #[serde(with = "serde_two_places")]
    pub service_cost: Decimal,
    #[serde(with = "serde_two_places")]
    pub enrollment_fee: Decimal,
    #[serde(with = "serde_two_places")]
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub paid_at: DateTime<Utc>,
    pub operator_id: Option<i64>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct MembershipRow {
    pub id: i64,
    pub client_id: Option<i64>,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub service_id: i64,
    pub service_name: String,
    pub service_type: ServiceType,
    pub starts_at: i64,
    pub ends_at: Option<i64>,
    pub active: bool,
    pub service_cost_cents: i64,
    pub enrollment_fee_cents: i64,
    pub payment_method: PaymentMethod,
    pub paid_at: i64,
    pub operator_id: Option<i64>,
}

/// Columns for `MembershipRow`; callers append WHERE/ORDER clauses
pub const MEMBERSHIP_SELECT: &str = r#"
    SELECT m.id, m.client_id, c.name AS client_name, c.email AS client_email,
           m.service_id, s.name AS service_name, s.service_type,
           m.starts_at, m.ends_at, m.active,
           m.service_cost_cents, m.enrollment_fee_cents,
           m.payment_method, m.paid_at, m.operator_id
    FROM memberships m
    JOIN services s ON s.id = m.service_id
    LEFT JOIN clients c ON c.id = m.client_id
"#;

impl From<MembershipRow> for Membership {
    fn from(row: MembershipRow) -> Self {
        let service_cost = money::from_cents(row.service_cost_cents);
        let enrollment_fee = money::from_cents(row.enrollment_fee_cents);
        Self {
            id: row.id,
            client_id: row.client_id,
            client_name: row.client_name,
            client_email: row.client_email,
            service_id: row.service_id,
            service_name: row.service_name,
            service_type: row.service_type,
            starts_at: from_millis(row.starts_at),
            ends_at: row.ends_at.map(from_millis),
            active: row.active,
            service_cost,
            enrollment_fee,
            total: service_cost + enrollment_fee,
            payment_method: row.payment_method,
            paid_at: from_millis(row.paid_at),
            operator_id: row.operator_id,
        }
    }
}

/// Result of recording a payment
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub membership: Membership,
    /// False when the confirmation email could not be delivered
    pub notification_sent: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MembershipInput {
    pub client_id: Option<i64>,
    pub service_id: Option<i64>,
    pub enrollment_fee: Option<Value>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMembership {
    pub client_id: i64,
    pub service_id: i64,
    pub enrollment_fee_cents: i64,
    pub payment_method: PaymentMethod,
}

impl MembershipInput {
    pub fn validate(&self) -> Result<NewMembership, AppError> {
        let client_id = self
            .client_id
            .ok_or_else(|| AppError::validation("client_id is required"))?;
        let service_id = self
            .service_id
            .ok_or_else(|| AppError::validation("service_id is required"))?;

        let enrollment_fee = match self.enrollment_fee.as_ref() {
            None | Some(Value::Null) => Decimal::ZERO,
            Some(Value::String(s)) if s.trim().is_empty() => Decimal::ZERO,
            fee => money::parse_non_negative(fee, "enrollment_fee")?,
        };

        Ok(NewMembership {
            client_id,
            service_id,
            enrollment_fee_cents: money::to_cents(enrollment_fee, "enrollment_fee")?,
            payment_method: self.payment_method,
        })
    }
}

/// Start of a new membership. Renewals paid before the current one runs out start the
/// day after it ends; anything else starts now.
pub fn next_start(latest_end: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match latest_end {
        Some(end) if end > now => end + Duration::days(1),
        _ => now,
    }
}

/// A membership grants access while flagged active and not past its end date
pub fn is_current(active: bool, ends_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    active && ends_at.map_or(true, |end| end >= now)
}
