//! Bulk Message Model
//!
//! Email blasts to a filtered set of clients, and the log of blasts already sent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::database::from_millis;
use crate::error::AppError;

pub const MAX_SUBJECT_CHARS: usize = 150;
pub const MIN_BODY_CHARS: usize = 10;
pub const MAX_BODY_CHARS: usize = 5000;
pub const MAX_TARGET_CHARS: usize = 120;
pub const SUMMARY_CHARS: usize = 300;
pub const HISTORY_PAGE_SIZE: i64 = 10;

/// Which clients receive a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecipientFilter {
    /// Every client on record
    #[default]
    Todos,
    /// Clients holding a current membership
    Activos,
    /// Clients without one
    Inactivos,
    Hombres,
    Mujeres,
    /// A single client named by id or email
    Especifico,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MassMessageRequest {
    #[serde(default)]
    pub filter: RecipientFilter,
    /// Client id or email, only for `especifico`
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

/// Who a validated request is addressed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    Filter(RecipientFilter),
    ClientId(i64),
    Email(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidMassMessage {
    pub filter: RecipientFilter,
    pub audience: Audience,
    pub subject: String,
    pub body: String,
}

impl MassMessageRequest {
    pub fn validate(&self) -> Result<ValidMassMessage, AppError> {
        let subject = self.subject.trim();
        let subject_len = subject.chars().count();
        if subject_len == 0 || subject_len > MAX_SUBJECT_CHARS {
            return Err(AppError::validation(format!(
                "Subject must be between 1 and {} characters",
                MAX_SUBJECT_CHARS
            )));
        }

        let body_len = self.body.trim().chars().count();
        if !(MIN_BODY_CHARS..=MAX_BODY_CHARS).contains(&body_len) {
            return Err(AppError::validation(format!(
                "Body must be between {} and {} characters",
                MIN_BODY_CHARS, MAX_BODY_CHARS
            )));
        }

        let target = self.target.as_deref().map(str::trim).unwrap_or_default();
        if target.chars().count() > MAX_TARGET_CHARS {
            return Err(AppError::validation(format!(
                "Client id or email must be at most {} characters",
                MAX_TARGET_CHARS
            )));
        }

        let audience = match self.filter {
            RecipientFilter::Especifico if target.is_empty() => {
                return Err(AppError::validation(
                    "A client id or email is required for a specific recipient",
                ))
            }
            RecipientFilter::Especifico => match target.parse::<i64>() {
                Ok(id) => Audience::ClientId(id),
                Err(_) => Audience::Email(target.to_lowercase()),
            },
            other => Audience::Filter(other),
        };

        Ok(ValidMassMessage {
            filter: self.filter,
            audience,
            subject: subject.to_string(),
            body: self.body.clone(),
        })
    }
}

/// First 300 characters of the body, with `...` appended when it was cut
pub fn summarize(body: &str) -> String {
    if body.chars().count() > SUMMARY_CHARS {
        let mut summary: String = body.chars().take(SUMMARY_CHARS).collect();
        summary.push_str("...");
        summary
    } else {
        body.to_string()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MassMessage {
    pub id: i64,
    pub sent_at: DateTime<Utc>,
    pub subject: String,
    pub body_summary: String,
    pub filter: String,
    pub total_sent: i64,
    pub operator_id: Option<i64>,
    pub operator_username: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct MassMessageRow {
    pub id: i64,
    pub sent_at: i64,
    pub subject: String,
    pub body_summary: String,
    pub filter: String,
    pub total_sent: i64,
    pub operator_id: Option<i64>,
    pub operator_username: Option<String>,
}

impl From<MassMessageRow> for MassMessage {
    fn from(row: MassMessageRow) -> Self {
        Self {
            id: row.id,
            sent_at: from_millis(row.sent_at),
            subject: row.subject,
            body_summary: row.body_summary,
            filter: row.filter,
            total_sent: row.total_sent,
            operator_id: row.operator_id,
            operator_username: row.operator_username,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<i64>,
}

impl HistoryQuery {
    /// Requested page, never below 1
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessagePage {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub pages: i64,
    pub items: Vec<MassMessage>,
}
