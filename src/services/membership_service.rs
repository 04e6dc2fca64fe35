//! Membership Payment Service
//!
//! Records a client's payment for a service. The new membership supersedes every earlier
//! one of the client; the confirmation email goes out only after the payment is committed.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::database::{begin_takings, from_millis, to_millis};
use crate::error::{AppError, AppResult};
use crate::models::membership::{
    next_start, Membership, MembershipInput, MembershipRow, PaymentReceipt, MEMBERSHIP_SELECT,
};
use crate::models::operator::Operator;
use crate::models::service::{Service, ServiceRow};
use crate::services::mailer::{deliver, Mailer, OutgoingEmail};
use crate::services::time_provider::TimeProvider;

#[derive(Clone)]
pub struct MembershipService {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
    mailer: Arc<dyn Mailer>,
    timezone: Tz,
}

impl MembershipService {
    pub fn new(
        pool: SqlitePool,
        time_provider: Arc<dyn TimeProvider>,
        mailer: Arc<dyn Mailer>,
        timezone: Tz,
    ) -> Self {
        Self {
            pool,
            time_provider,
            mailer,
            timezone,
        }
    }

    async fn fetch(conn: &mut SqliteConnection, id: i64) -> Result<Option<Membership>, sqlx::Error> {
        let row = sqlx::query_as::<_, MembershipRow>(&format!("{} WHERE m.id = ?", MEMBERSHIP_SELECT))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.map(Membership::from))
    }

    /// Record a payment and send the confirmation email
    pub async fn record_payment(
        &self,
        input: &MembershipInput,
        operator: &Operator,
    ) -> AppResult<PaymentReceipt> {
        let payment = input.validate()?;
        let mut tx = begin_takings(&self.pool).await?;
        let now = self.time_provider.now_millis();

        let client_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM clients WHERE id = ?")
            .bind(payment.client_id)
            .fetch_optional(&mut *tx)
            .await?;
        if client_exists.is_none() {
            return Err(AppError::not_found("Client"));
        }

        let service: Service = sqlx::query_as::<_, ServiceRow>(
            "SELECT id, name, service_type, cost_cents FROM services WHERE id = ?",
        )
        .bind(payment.service_id)
        .fetch_optional(&mut *tx)
        .await?
        .map(Service::from)
        .ok_or_else(|| AppError::not_found("Service"))?;

        let latest_end: Option<i64> =
            sqlx::query_scalar("SELECT MAX(ends_at) FROM memberships WHERE client_id = ?")
                .bind(payment.client_id)
                .fetch_one(&mut *tx)
                .await?;

        let starts_at = next_start(latest_end.map(from_millis), now);
        let ends_at = service.service_type.end_date(starts_at)?;
        debug!(
            client_id = payment.client_id,
            starts_at = %starts_at,
            ends_at = %ends_at,
            "Membership period computed"
        );

        let superseded = sqlx::query("UPDATE memberships SET active = 0 WHERE client_id = ? AND active = 1")
            .bind(payment.client_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        crate::logging::log_database_operation("UPDATE", "memberships", Some(superseded));

        let id = sqlx::query(
            r#"
            INSERT INTO memberships (
                client_id, service_id, starts_at, ends_at, active, service_cost_cents,
                enrollment_fee_cents, payment_method, paid_at, operator_id
            )
            VALUES (?, ?, ?, ?, 1, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(payment.client_id)
        .bind(service.id)
        .bind(to_millis(starts_at))
        .bind(to_millis(ends_at))
        .bind(crate::models::money::to_cents(service.cost, "cost")?)
        .bind(payment.enrollment_fee_cents)
        .bind(payment.payment_method)
        .bind(to_millis(now))
        .bind(operator.id)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let membership = Self::fetch(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::internal_error("Membership vanished after insert"))?;
        tx.commit().await?;

        crate::logging::log_membership_payment(
            id,
            payment.client_id,
            &membership.service_name,
            membership.total,
        );

        let notification_sent = self.notify(&membership).await;
        Ok(PaymentReceipt {
            membership,
            notification_sent,
        })
    }

    /// Send the payment confirmation. Failures are logged, never propagated.
    async fn notify(&self, membership: &Membership) -> bool {
        let Some(to) = membership.client_email.clone() else {
            return false;
        };

        let email = OutgoingEmail {
            to,
            subject: format!("Confirmación de pago: {}", membership.service_name),
            body: self.confirmation_body(membership),
        };

        match deliver(self.mailer.clone(), email).await {
            Ok(()) => true,
            Err(err) => {
                warn!(membership_id = membership.id, error = %err, "Payment confirmation not sent");
                false
            }
        }
    }

    fn local_date(&self, instant: DateTime<Utc>) -> String {
        instant.with_timezone(&self.timezone).format("%d/%m/%Y").to_string()
    }

    fn confirmation_body(&self, membership: &Membership) -> String {
        let ends = membership
            .ends_at
            .map(|end| self.local_date(end))
            .unwrap_or_else(|| "sin fecha de término".to_string());

        format!(
            "Hola {},\n\nRegistramos tu pago del servicio {} ({}).\n\
             Vigencia: del {} al {}.\n\
             Costo del servicio: ${:.2}\nInscripción: ${:.2}\nTotal pagado: ${:.2}\n\n\
             ¡Gracias por entrenar con nosotros!",
            membership.client_name.as_deref().unwrap_or("cliente"),
            membership.service_name,
            membership.service_type,
            self.local_date(membership.starts_at),
            ends,
            membership.service_cost,
            membership.enrollment_fee,
            membership.total,
        )
    }

    /// Every payment, newest first
    pub async fn list(&self) -> AppResult<Vec<Membership>> {
        let rows = sqlx::query_as::<_, MembershipRow>(&format!(
            "{} ORDER BY m.paid_at DESC, m.id DESC",
            MEMBERSHIP_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Membership::from).collect())
    }

    pub async fn get(&self, id: i64) -> AppResult<Membership> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::not_found("Membership"))
    }
}
