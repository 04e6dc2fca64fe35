//! Attendance Model
//!
//! Front-door check-ins. A client may check in once per local calendar day while the gym
//! is open and they hold a current membership.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::from_millis;
use crate::error::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct Attendance {
    pub id: i64,
    pub client_id: Option<i64>,
    pub client_name: Option<String>,
    pub checked_in_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct AttendanceRow {
    pub id: i64,
    pub client_id: Option<i64>,
    pub client_name: Option<String>,
    pub checked_in_at: i64,
}

impl From<AttendanceRow> for Attendance {
    fn from(row: AttendanceRow) -> Self {
        Self {
            id: row.id,
            client_id: row.client_id,
            client_name: row.client_name,
            checked_in_at: from_millis(row.checked_in_at),
        }
    }
}

/// What the door terminal sends: the client id as typed or scanned
#[derive(Debug, Clone, Deserialize)]
pub struct CheckInRequest {
    #[serde(default)]
    pub entry: String,
}

/// Minimal client identity echoed back to the door terminal
#[derive(Debug, Clone, Serialize)]
pub struct CheckInClient {
    pub id: i64,
    pub name: String,
}

/// Why a check-in was turned away, in the order the checks run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInRefusal {
    Closed { opening: NaiveTime, closing: NaiveTime },
    UnknownClient { entry: String },
    NoActiveMembership { name: String },
    AlreadyCheckedIn { name: String },
}

impl CheckInRefusal {
    pub fn reason(&self) -> &'static str {
        match self {
            CheckInRefusal::Closed { .. } => "closed",
            CheckInRefusal::UnknownClient { .. } => "unknown_client",
            CheckInRefusal::NoActiveMembership { .. } => "no_active_membership",
            CheckInRefusal::AlreadyCheckedIn { .. } => "already_checked_in",
        }
    }

    pub fn message(&self) -> String {
        match self {
            CheckInRefusal::Closed { opening, closing } => format!(
                "El gimnasio está cerrado. El horario de acceso es de {} a {}.",
                opening.format("%H:%M"),
                closing.format("%H:%M")
            ),
            CheckInRefusal::UnknownClient { .. } => "Cliente no encontrado.".to_string(),
            CheckInRefusal::NoActiveMembership { name } => {
                format!("El cliente {} no tiene una membresía activa.", name)
            }
            CheckInRefusal::AlreadyCheckedIn { name } => {
                format!("El cliente {} ya registró su asistencia el día de hoy.", name)
            }
        }
    }
}

impl From<CheckInRefusal> for AppError {
    fn from(refusal: CheckInRefusal) -> Self {
        let message = refusal.message();
        match refusal {
            CheckInRefusal::Closed { .. } | CheckInRefusal::NoActiveMembership { .. } => {
                AppError::Forbidden(message)
            }
            CheckInRefusal::UnknownClient { .. } => AppError::NotFound(message),
            CheckInRefusal::AlreadyCheckedIn { .. } => AppError::Conflict(message),
        }
    }
}

/// Answer of the read-only access check
#[derive(Debug, Clone, Serialize)]
pub struct AccessCheck {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<CheckInClient>,
}

impl AccessCheck {
    pub fn granted(client: CheckInClient) -> Self {
        Self {
            status: "success",
            message: format!("Acceso permitido para {}.", client.name),
            client: Some(client),
        }
    }

    pub fn refused(refusal: &CheckInRefusal) -> Self {
        Self {
            status: "error",
            message: refusal.message(),
            client: None,
        }
    }
}

/// Parse the entry as a client id. Anything non-numeric can never match a client.
pub fn parse_entry(entry: &str) -> Option<i64> {
    entry.trim().parse::<i64>().ok().filter(|id| *id > 0)
}
