//! Bulk Messaging Service
//!
//! Sends one email per distinct recipient address. Delivery stops at the first failure
//! and nothing is logged as sent; a blast is recorded only when every email went out.

use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::warn;

use crate::database::to_millis;
use crate::error::{AppError, AppResult};
use crate::models::mass_message::{
    summarize, Audience, MassMessage, MassMessageRequest, MassMessageRow, MessagePage,
    RecipientFilter, HISTORY_PAGE_SIZE,
};
use crate::models::operator::Operator;
use crate::services::mailer::{deliver, Mailer, OutgoingEmail};
use crate::services::time_provider::TimeProvider;

const CURRENT_MEMBERSHIP: &str = r#"
    EXISTS (
        SELECT 1 FROM memberships m
        WHERE m.client_id = c.id AND m.active = 1
          AND (m.ends_at IS NULL OR m.ends_at >= ?)
    )
"#;

const MESSAGE_SELECT: &str = r#"
    SELECT mm.id, mm.sent_at, mm.subject, mm.body_summary, mm.filter, mm.total_sent,
           mm.operator_id, o.username AS operator_username
    FROM mass_messages mm
    LEFT JOIN operators o ON o.id = mm.operator_id
"#;

/// The one value a recipient query may take
enum Param {
    None,
    Integer(i64),
    Text(String),
}

#[derive(Clone)]
pub struct MessagingService {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
    mailer: Arc<dyn Mailer>,
}

impl MessagingService {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            pool,
            time_provider,
            mailer,
        }
    }

    /// Distinct addresses the audience resolves to, in address order
    pub async fn recipients(&self, audience: &Audience) -> AppResult<Vec<String>> {
        let now = to_millis(self.time_provider.now_millis());

        let (condition, param) = match audience {
            Audience::Filter(RecipientFilter::Todos) => (String::new(), Param::None),
            Audience::Filter(RecipientFilter::Activos) => {
                (format!("WHERE {}", CURRENT_MEMBERSHIP), Param::Integer(now))
            }
            Audience::Filter(RecipientFilter::Inactivos) => {
                (format!("WHERE NOT {}", CURRENT_MEMBERSHIP), Param::Integer(now))
            }
            Audience::Filter(RecipientFilter::Hombres) => {
                ("WHERE c.sex = 'Masculino'".to_string(), Param::None)
            }
            Audience::Filter(RecipientFilter::Mujeres) => {
                ("WHERE c.sex = 'Femenino'".to_string(), Param::None)
            }
            Audience::Filter(RecipientFilter::Especifico) => return Ok(Vec::new()),
            Audience::ClientId(id) => ("WHERE c.id = ?".to_string(), Param::Integer(*id)),
            Audience::Email(email) => ("WHERE c.email = ?".to_string(), Param::Text(email.clone())),
        };

        let sql = format!(
            "SELECT DISTINCT c.email FROM clients c {} ORDER BY c.email",
            condition
        );
        let query = sqlx::query_scalar::<_, String>(&sql);
        let query = match param {
            Param::None => query,
            Param::Integer(value) => query.bind(value),
            Param::Text(value) => query.bind(value),
        };

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Send a blast and record it
    pub async fn send(&self, request: &MassMessageRequest, operator: &Operator) -> AppResult<MassMessage> {
        let message = request.validate()?;
        let recipients = self.recipients(&message.audience).await?;
        if recipients.is_empty() {
            return Err(AppError::NotFound(
                "No clients match the selected recipients".to_string(),
            ));
        }

        let filter = message.filter.to_string();
        let mut sent = 0;
        for to in &recipients {
            let email = OutgoingEmail {
                to: to.clone(),
                subject: message.subject.clone(),
                body: message.body.clone(),
            };
            if let Err(err) = deliver(self.mailer.clone(), email).await {
                warn!(sent, total = recipients.len(), error = %err, "Bulk message interrupted");
                crate::logging::log_bulk_dispatch(&filter, recipients.len(), sent);
                return Err(AppError::MailDelivery {
                    sent,
                    reason: err.to_string(),
                });
            }
            sent += 1;
        }
        crate::logging::log_bulk_dispatch(&filter, recipients.len(), sent);

        let sent_at = self.time_provider.now_millis();
        let id = sqlx::query(
            r#"
            INSERT INTO mass_messages (sent_at, subject, body_summary, filter, total_sent, operator_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(to_millis(sent_at))
        .bind(&message.subject)
        .bind(summarize(&message.body))
        .bind(&filter)
        .bind(sent as i64)
        .bind(operator.id)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        sqlx::query_as::<_, MassMessageRow>(&format!("{} WHERE mm.id = ?", MESSAGE_SELECT))
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map(MassMessage::from)
            .map_err(AppError::from)
    }

    /// One page of the blast log, newest first
    pub async fn history(&self, page: i64) -> AppResult<MessagePage> {
        let page = page.max(1);
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM mass_messages")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, MassMessageRow>(&format!(
            "{} ORDER BY mm.sent_at DESC, mm.id DESC LIMIT ? OFFSET ?",
            MESSAGE_SELECT
        ))
        .bind(HISTORY_PAGE_SIZE)
        .bind((page - 1).saturating_mul(HISTORY_PAGE_SIZE))
        .fetch_all(&self.pool)
        .await?;

        Ok(MessagePage {
            page,
            per_page: HISTORY_PAGE_SIZE,
            total,
            pages: (total + HISTORY_PAGE_SIZE - 1) / HISTORY_PAGE_SIZE,
            items: rows.into_iter().map(MassMessage::from).collect(),
        })
    }
}
