//! Unit Tests for the Membership Service

use chrono::{Duration, TimeZone};
use chrono_tz::America::Mexico_City;

use gym_desk::models::payment_method::PaymentMethod;
use gym_desk::services::mailer::RecordingMailer;
use gym_desk::AppError;

use super::test_utils::UnitContext;

#[tokio::test]
async fn test_renewal_chain_extends_from_latest_end() {
    let ctx = UnitContext::new().await;
    let ana = ctx.client("Ana", "ana@example.com").await;
    let fortnight = ctx.service("Quincena", "quincenal", "250").await;
    let memberships = &ctx.state.memberships;

    let first = memberships
        .record_payment(&UnitContext::payment(ana, fortnight, "", PaymentMethod::Cash), &ctx.operator)
        .await
        .unwrap()
        .membership;
    assert_eq!(first.starts_at, ctx.clock.current_time());
    assert_eq!(first.ends_at, Some(first.starts_at + Duration::days(15)));

    // Two renewals paid the same day stack one after the other
    let second = memberships
        .record_payment(&UnitContext::payment(ana, fortnight, "", PaymentMethod::Cash), &ctx.operator)
        .await
        .unwrap()
        .membership;
    let first_end = first.ends_at.unwrap();
    assert_eq!(second.starts_at, first_end + Duration::days(1));

    let third = memberships
        .record_payment(&UnitContext::payment(ana, fortnight, "", PaymentMethod::Cash), &ctx.operator)
        .await
        .unwrap()
        .membership;
    assert_eq!(third.starts_at, second.ends_at.unwrap() + Duration::days(1));

    let detail = ctx.state.clients.detail(ana).await.unwrap();
    let active: Vec<_> = detail.memberships.iter().filter(|m| m.active).collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, third.id);
}

#[tokio::test]
async fn test_lapsed_membership_restarts_today() {
    let ctx = UnitContext::new().await;
    let ana = ctx.client("Ana", "ana@example.com").await;
    let day = ctx.service("Visita", "diaria", "60").await;
    let memberships = &ctx.state.memberships;

    memberships
        .record_payment(&UnitContext::payment(ana, day, "0", PaymentMethod::Cash), &ctx.operator)
        .await
        .unwrap();

    ctx.clock.advance_days(3);
    let renewed = memberships
        .record_payment(&UnitContext::payment(ana, day, "0", PaymentMethod::Cash), &ctx.operator)
        .await
        .unwrap()
        .membership;
    assert_eq!(renewed.starts_at, ctx.clock.current_time());
}

#[tokio::test]
async fn test_confirmation_email_uses_local_dates() {
    let ctx = UnitContext::new().await;
    let ana = ctx.client("Ana", "ana@example.com").await;
    let monthly = ctx.service("Mensualidad", "mensual", "450").await;

    // 20:00 local on 30 June is already 1 July in UTC
    ctx.clock.set_time(
        Mexico_City
            .with_ymd_and_hms(2025, 6, 30, 20, 0, 0)
            .single()
            .unwrap()
            .with_timezone(&chrono::Utc),
    );
    let receipt = ctx
        .state
        .memberships
        .record_payment(&UnitContext::payment(ana, monthly, "100", PaymentMethod::Card), &ctx.operator)
        .await
        .unwrap();
    assert!(receipt.notification_sent);

    let sent = ctx.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].subject.contains("Mensualidad"));
    assert!(sent[0].body.contains("del 30/06/2025"));
    assert!(sent[0].body.contains("Total pagado: $550.00"));
}

#[tokio::test]
async fn test_failed_email_keeps_the_payment() {
    let ctx = UnitContext::with_mailer(RecordingMailer::failing_after(0)).await;
    let ana = ctx.client("Ana", "ana@example.com").await;
    let monthly = ctx.service("Mensualidad", "mensual", "450").await;

    let receipt = ctx
        .state
        .memberships
        .record_payment(&UnitContext::payment(ana, monthly, "0", PaymentMethod::Cash), &ctx.operator)
        .await
        .unwrap();
    assert!(!receipt.notification_sent);
    assert_eq!(ctx.state.memberships.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_client_or_service_writes_nothing() {
    let ctx = UnitContext::new().await;
    let ana = ctx.client("Ana", "ana@example.com").await;
    let monthly = ctx.service("Mensualidad", "mensual", "450").await;

    let no_client = ctx
        .state
        .memberships
        .record_payment(&UnitContext::payment(999, monthly, "0", PaymentMethod::Cash), &ctx.operator)
        .await;
    assert!(matches!(no_client, Err(AppError::NotFound(_))));

    let no_service = ctx
        .state
        .memberships
        .record_payment(&UnitContext::payment(ana, 999, "0", PaymentMethod::Cash), &ctx.operator)
        .await;
    assert!(matches!(no_service, Err(AppError::NotFound(_))));

    assert!(ctx.state.memberships.list().await.unwrap().is_empty());
    assert!(ctx.mailer.sent().is_empty());
}
