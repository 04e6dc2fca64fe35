//! Service Catalog Model
//!
//! A service is something a client pays a membership for: a day pass, a month, a year.
//! Its `ServiceType` decides how long the membership lasts.

use chrono::{DateTime, Duration, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use thiserror::Error;

use super::money::{self, serde_two_places};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceTypeError {
    #[error("Unknown service type '{0}'")]
    Unknown(String),

    #[error("Membership end date is out of range")]
    DateOverflow,
}

/// Billing period of a service
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum ServiceType {
    Diaria,
    Semanal,
    Quincenal,
    Mensual,
    Bimestral,
    Trimestral,
    Cuatrimestral,
    Semestral,
    Anual,
    Bienal,
}

/// How far a membership of a given type extends past its start
enum Span {
    Days(i64),
    Months(u32),
}

impl ServiceType {
    fn span(&self) -> Span {
        match self {
            ServiceType::Diaria => Span::Days(1),
            ServiceType::Semanal => Span::Days(7),
            ServiceType::Quincenal => Span::Days(15),
            ServiceType::Mensual => Span::Months(1),
            ServiceType::Bimestral => Span::Months(2),
            ServiceType::Trimestral => Span::Months(3),
            ServiceType::Cuatrimestral => Span::Months(4),
            ServiceType::Semestral => Span::Months(6),
            ServiceType::Anual => Span::Months(12),
            ServiceType::Bienal => Span::Months(24),
        }
    }

    /// End of a membership starting at `start`. Month steps clamp to the last day of
    /// shorter months (Jan 31 + 1 month = Feb 28/29).
    pub fn end_date(&self, start: DateTime<Utc>) -> Result<DateTime<Utc>, ServiceTypeError> {
        match self.span() {
            Span::Days(days) => start.checked_add_signed(Duration::days(days)),
            Span::Months(months) => start.checked_add_months(Months::new(months)),
        }
        .ok_or(ServiceTypeError::DateOverflow)
    }

    /// Parse a wire tag, case-insensitively
    pub fn parse(tag: &str) -> Result<Self, ServiceTypeError> {
        tag.trim()
            .to_lowercase()
            .parse()
            .map_err(|_| ServiceTypeError::Unknown(tag.to_string()))
    }

    /// All known tags, for validation messages
    pub fn tags() -> Vec<String> {
        Self::iter().map(|t| t.to_string()).collect()
    }
}

/// A service offered by the gym
#[derive(Debug, Clone, Serialize)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub service_type: ServiceType,
    #[serde(with = "serde_two_places")]
    pub cost: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ServiceRow {
    pub id: i64,
    pub name: String,
    pub service_type: ServiceType,
    pub cost_cents: i64,
}

impl From<ServiceRow> for Service {
    fn from(row: ServiceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            service_type: row.service_type,
            cost: money::from_cents(row.cost_cents),
        }
    }
}

/// Create/update payload. Cost and type arrive loosely typed and are checked by `validate`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub service_type: String,
    pub cost: Option<Value>,
}

/// A service payload that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidService {
    pub name: String,
    pub service_type: ServiceType,
    pub cost_cents: i64,
}

impl ServiceInput {
    pub fn validate(&self) -> Result<ValidService, crate::error::AppError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(crate::error::AppError::validation("Service name is required"));
        }

        let service_type = ServiceType::parse(&self.service_type)?;
        let cost = money::parse_non_negative(self.cost.as_ref(), "cost")?;

        Ok(ValidService {
            name: name.to_string(),
            service_type,
            cost_cents: money::to_cents(cost, "cost")?,
        })
    }
}
