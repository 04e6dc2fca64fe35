//! Client Model
//!
//! Gym members and their contact data. Membership history and check-ins reference a
//! client by id and survive the client's deletion.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

use super::membership::Membership;
use super::service::ServiceType;
use crate::database::from_millis;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
pub enum Sex {
    Masculino,
    Femenino,
    Otro,
}

/// Derived from memberships: `Activo` while any membership is active and unexpired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientStatus {
    Activo,
    Inactivo,
}

impl ClientStatus {
    pub fn from_active(active: bool) -> Self {
        if active {
            ClientStatus::Activo
        } else {
            ClientStatus::Inactivo
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub sex: Sex,
    pub address: Option<String>,
    pub emergency_phone: Option<String>,
    pub age: Option<i64>,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ClientRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub sex: Sex,
    pub address: Option<String>,
    pub emergency_phone: Option<String>,
    pub age: Option<i64>,
    pub registered_at: i64,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            sex: row.sex,
            address: row.address,
            emergency_phone: row.emergency_phone,
            age: row.age,
            registered_at: from_millis(row.registered_at),
        }
    }
}

/// A client with its derived membership status, as listed on the front desk
#[derive(Debug, Clone, Serialize)]
pub struct ClientSummary {
    #[serde(flatten)]
    pub client: Client,
    pub status: ClientStatus,
}

/// Service a client is currently enrolled in
#[derive(Debug, Clone, Serialize)]
pub struct CurrentService {
    pub service_name: String,
    pub service_type: ServiceType,
    pub ends_at: Option<DateTime<Utc>>,
}

/// Client page: contact data, status, current service and every membership paid
#[derive(Debug, Clone, Serialize)]
pub struct ClientDetail {
    #[serde(flatten)]
    pub client: Client,
    pub status: ClientStatus,
    pub current_service: Option<CurrentService>,
    pub memberships: Vec<Membership>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ClientStatusRow {
    #[sqlx(flatten)]
    pub client: ClientRow,
    pub is_active: bool,
}

impl From<ClientStatusRow> for ClientSummary {
    fn from(row: ClientStatusRow) -> Self {
        Self {
            client: row.client.into(),
            status: ClientStatus::from_active(row.is_active),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default, alias = "query")]
    pub q: String,
}

/// Create payload. Everything is optional at the serde level so a missing field
/// becomes a validation error naming the field rather than a bare 422.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub sex: Option<Sex>,
    pub address: Option<String>,
    pub emergency_phone: Option<String>,
    /// Accepts a number or a numeric string
    pub age: Option<Value>,
}

/// Update payload: contact fields only
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub emergency_phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub sex: Sex,
    pub address: Option<String>,
    pub emergency_phone: Option<String>,
    pub age: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactChange {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub emergency_phone: Option<String>,
}

fn email_format() -> Option<&'static Regex> {
    static FORMAT: OnceLock<Option<Regex>> = OnceLock::new();
    FORMAT
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok())
        .as_ref()
}

fn required(value: &Option<String>, field: &str) -> Result<String, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::validation(format!("{} is required", field)))
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn validated_email(value: &Option<String>) -> Result<String, AppError> {
    let email = required(value, "email")?.to_lowercase();
    if email.len() > 120 || email_format().is_some_and(|re| !re.is_match(&email)) {
        return Err(AppError::validation(format!("'{}' is not a valid email address", email)));
    }
    Ok(email)
}

fn parse_age(value: Option<&Value>) -> Result<Option<i64>, AppError> {
    let age = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(Value::Number(n)) => n.as_i64(),
        Some(_) => None,
    };

    match age {
        Some(age) if (0..=130).contains(&age) => Ok(Some(age)),
        _ => Err(AppError::validation("age must be a whole number")),
    }
}

impl ClientInput {
    pub fn validate(&self) -> Result<NewClient, AppError> {
        Ok(NewClient {
            name: required(&self.name, "name")?,
            email: validated_email(&self.email)?,
            phone: required(&self.phone, "phone")?,
            sex: self.sex.ok_or_else(|| AppError::validation("sex is required"))?,
            address: optional(&self.address),
            emergency_phone: optional(&self.emergency_phone),
            age: parse_age(self.age.as_ref())?,
        })
    }
}

impl ClientUpdate {
    pub fn validate(&self) -> Result<ContactChange, AppError> {
        Ok(ContactChange {
            name: required(&self.name, "name")?,
            email: validated_email(&self.email)?,
            phone: required(&self.phone, "phone")?,
            address: optional(&self.address),
            emergency_phone: optional(&self.emergency_phone),
        })
    }
}
