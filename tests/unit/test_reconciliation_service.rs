//! Unit Tests for the Reconciliation Service

use rust_decimal::Decimal;
use serde_json::json;

use gym_desk::models::cash_closing::{ClosingOutcome, ReconciliationError};
use gym_desk::models::payment_method::PaymentMethod;

use super::test_utils::UnitContext;

fn amount(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

#[tokio::test]
async fn test_concurrent_closings_produce_one_record() {
    let ctx = UnitContext::new().await;
    let water = ctx.product("Agua", "50.00", 10).await;
    ctx.sell(water, 1, PaymentMethod::Cash).await;
    ctx.clock.advance_minutes(1);

    let counted = json!("150.00");
    let service = ctx.state.reconciliation.clone();
    let (first, second) = tokio::join!(
        service.close_register(Some(&counted), &ctx.operator),
        service.close_register(Some(&counted), &ctx.operator),
    );

    let results = [first, second];
    let closed = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(ReconciliationError::Conflict(_))))
        .count();
    assert_eq!(closed, 1);
    assert_eq!(conflicts, 1);

    let history = ctx.state.reconciliation.history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].outcome, ClosingOutcome::Exact);
}

#[tokio::test]
async fn test_sales_and_payments_land_in_one_period() {
    let ctx = UnitContext::new().await;
    let ana = ctx.client("Ana", "ana@example.com").await;
    let weekly = ctx.service("Semana", "semanal", "150").await;
    let bar = ctx.product("Barra", "22.50", 10).await;

    ctx.state
        .memberships
        .record_payment(&UnitContext::payment(ana, weekly, "0", PaymentMethod::Card), &ctx.operator)
        .await
        .unwrap();
    ctx.sell(bar, 2, PaymentMethod::Cash).await;
    ctx.clock.advance_minutes(5);

    let totals = ctx.state.reconciliation.period_totals().await.unwrap();
    assert_eq!(totals.product_cash, amount(4500));
    assert_eq!(totals.membership_card, amount(15000));
    assert_eq!(totals.cash_total, amount(4500));
    assert_eq!(totals.card_total, amount(15000));
    assert_eq!(totals.grand_total, amount(19500));
    assert_eq!(totals.period_end, ctx.clock.current_time());

    let report = ctx
        .state
        .reconciliation
        .close_register(Some(&json!(140)), &ctx.operator)
        .await
        .unwrap();
    assert_eq!(report.expected_cash, amount(14500));
    assert_eq!(report.closing.variance, amount(-500));
    assert_eq!(report.closing.outcome, ClosingOutcome::Shortage);
    assert_eq!(report.closing.system_card, amount(15000));

    // Nothing happened since the closing
    ctx.clock.advance_hours(2);
    let preview = ctx.state.reconciliation.preview().await.unwrap();
    assert_eq!(preview.totals.period_start, report.closing.closed_at);
    assert_eq!(preview.totals.grand_total, Decimal::ZERO);
    assert_eq!(preview.expected_cash, ctx.state.reconciliation.starting_float());
}

#[tokio::test]
async fn test_closing_needs_time_to_pass() {
    let ctx = UnitContext::new().await;

    ctx.state
        .reconciliation
        .close_register(Some(&json!("100")), &ctx.operator)
        .await
        .unwrap();

    let same_instant = ctx
        .state
        .reconciliation
        .close_register(Some(&json!("100")), &ctx.operator)
        .await;
    assert!(matches!(same_instant, Err(ReconciliationError::Conflict(_))));

    // A clock set back behind the last closing
    ctx.clock.advance_minutes(-30);
    let behind = ctx
        .state
        .reconciliation
        .close_register(Some(&json!("100")), &ctx.operator)
        .await;
    assert!(matches!(behind, Err(ReconciliationError::Conflict(_))));

    ctx.clock.advance_minutes(31);
    let later = ctx
        .state
        .reconciliation
        .close_register(Some(&json!("100")), &ctx.operator)
        .await
        .unwrap();
    assert_eq!(later.closing.outcome, ClosingOutcome::Exact);
    assert_eq!(ctx.state.reconciliation.history().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_prepaid_renewal_counts_when_paid() {
    let ctx = UnitContext::new().await;
    let ana = ctx.client("Ana", "ana@example.com").await;
    let monthly = ctx.service("Mensualidad", "mensual", "450").await;
    let memberships = &ctx.state.memberships;

    memberships
        .record_payment(&UnitContext::payment(ana, monthly, "0", PaymentMethod::Cash), &ctx.operator)
        .await
        .unwrap();
    let renewal = memberships
        .record_payment(&UnitContext::payment(ana, monthly, "0", PaymentMethod::Cash), &ctx.operator)
        .await
        .unwrap()
        .membership;
    ctx.clock.advance_minutes(5);
    assert!(renewal.starts_at > ctx.clock.current_time());

    let report = ctx
        .state
        .reconciliation
        .close_register(Some(&json!("1000")), &ctx.operator)
        .await
        .unwrap();
    assert_eq!(report.closing.system_cash, amount(90000));
    assert_eq!(report.closing.outcome, ClosingOutcome::Exact);

    // The renewal's service period starts later, but its money was already reconciled
    ctx.clock.set_time(renewal.starts_at + chrono::Duration::days(2));
    let totals = ctx.state.reconciliation.period_totals().await.unwrap();
    assert_eq!(totals.period_start, report.closing.closed_at);
    assert_eq!(totals.membership_cash, Decimal::ZERO);
    assert_eq!(totals.grand_total, Decimal::ZERO);
}

#[tokio::test]
async fn test_sale_at_closing_instant_is_left_for_next_period() {
    let ctx = UnitContext::new().await;
    let water = ctx.product("Agua", "50.00", 10).await;
    ctx.sell(water, 1, PaymentMethod::Cash).await;
    ctx.clock.advance_minutes(1);

    let report = ctx
        .state
        .reconciliation
        .close_register(Some(&json!("150")), &ctx.operator)
        .await
        .unwrap();
    assert_eq!(report.closing.system_cash, amount(5000));

    // Clock still reads the closing instant
    assert_eq!(ctx.clock.current_time(), report.closing.closed_at);
    ctx.sell(water, 2, PaymentMethod::Cash).await;

    ctx.clock.advance_minutes(1);
    let totals = ctx.state.reconciliation.period_totals().await.unwrap();
    assert_eq!(totals.period_start, report.closing.closed_at);
    assert_eq!(totals.product_cash, amount(10000));
}
