//! Operator Model
//!
//! Front-desk and back-office staff. Requests name their operator; who may act as
//! which operator is decided upstream.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::database::from_millis;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum OperatorRole {
    Admin,
    #[default]
    Staff,
}

#[derive(Debug, Clone, Serialize)]
pub struct Operator {
    pub id: i64,
    pub username: String,
    pub role: OperatorRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct OperatorRow {
    pub id: i64,
    pub username: String,
    pub role: OperatorRole,
    pub created_at: i64,
}

impl From<OperatorRow> for Operator {
    fn from(row: OperatorRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            role: row.role,
            created_at: from_millis(row.created_at),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperatorInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub role: OperatorRole,
}

fn username_format() -> Option<&'static Regex> {
    static FORMAT: OnceLock<Option<Regex>> = OnceLock::new();
    FORMAT
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_.\-]{3,32}$").ok())
        .as_ref()
}

impl OperatorInput {
    /// Trimmed username, 3 to 32 letters, digits, `_`, `.` or `-`
    pub fn validated_username(&self) -> Result<String, AppError> {
        let username = self.username.trim();
        let valid = username_format().map_or(!username.is_empty(), |re| re.is_match(username));
        if !valid {
            return Err(AppError::validation(
                "Username must be 3-32 characters of letters, digits, '_', '.' or '-'",
            ));
        }
        Ok(username.to_string())
    }
}
