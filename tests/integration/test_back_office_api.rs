//! Bulk messages, dashboard statistics and health through the HTTP API

use serde_json::{json, Value};

use gym_desk::services::mailer::RecordingMailer;

use crate::test_utils::TestContext;

fn blast(filter: &str) -> Value {
    json!({
        "filter": filter,
        "subject": "Horario de verano",
        "body": "A partir del lunes abrimos a las 5:00."
    })
}

#[tokio::test]
async fn test_health_is_public() {
    let ctx = TestContext::new().await;

    let response = ctx.server.get("/api/health").await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Value>()["status"], "ok");
}

#[tokio::test]
async fn test_bulk_message_filters() {
    let ctx = TestContext::new().await;
    ctx.create_client("Ana", "ana@example.com", "Femenino").await;
    ctx.create_client("Luis", "luis@example.com", "Masculino").await;
    ctx.create_client("Sofía", "sofia@example.com", "Femenino").await;

    let everyone = ctx.create("/api/messages", blast("todos")).await;
    assert_eq!(everyone["total_sent"], 3);
    assert_eq!(everyone["filter"], "todos");
    assert_eq!(everyone["operator_username"], "recepcion");
    assert_eq!(ctx.mailer.sent().len(), 3);

    let women = ctx.create("/api/messages", blast("mujeres")).await;
    assert_eq!(women["total_sent"], 2);

    let mut one = blast("especifico");
    one["target"] = json!("LUIS@example.com");
    let specific = ctx.create("/api/messages", one).await;
    assert_eq!(specific["total_sent"], 1);
    assert_eq!(ctx.mailer.sent().last().unwrap().to, "luis@example.com");

    let inactive = ctx.create("/api/messages", blast("inactivos")).await;
    assert_eq!(inactive["total_sent"], 3);
}

#[tokio::test]
async fn test_bulk_message_rejections() {
    let ctx = TestContext::new().await;
    ctx.create_client("Ana", "ana@example.com", "Femenino").await;

    let no_target = ctx.post("/api/messages").json(&blast("especifico")).await;
    assert_eq!(no_target.status_code(), 400);

    let short = ctx
        .post("/api/messages")
        .json(&json!({ "filter": "todos", "subject": "Aviso", "body": "corto" }))
        .await;
    assert_eq!(short.status_code(), 400);

    // Nobody holds a membership yet
    let nobody = ctx.post("/api/messages").json(&blast("activos")).await;
    assert_eq!(nobody.status_code(), 404);

    assert!(ctx.mailer.sent().is_empty());
    let history: Value = ctx.get("/api/messages").await.json();
    assert_eq!(history["total"], 0);
}

#[tokio::test]
async fn test_interrupted_blast_is_not_recorded() {
    let ctx = TestContext::with_mailer(RecordingMailer::failing_after(1)).await;
    ctx.create_client("Ana", "ana@example.com", "Femenino").await;
    ctx.create_client("Luis", "luis@example.com", "Masculino").await;

    let response = ctx.post("/api/messages").json(&blast("todos")).await;
    assert_eq!(response.status_code(), 502);
    assert_eq!(response.json::<Value>()["error"], "MailDelivery");
    assert_eq!(ctx.mailer.sent().len(), 1);

    let history: Value = ctx.get("/api/messages").await.json();
    assert_eq!(history["total"], 0);
    assert!(history["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_message_history_pages() {
    let ctx = TestContext::new().await;
    ctx.create_client("Ana", "ana@example.com", "Femenino").await;

    for _ in 0..11 {
        ctx.create("/api/messages", blast("todos")).await;
        ctx.clock.advance_minutes(1);
    }

    let first: Value = ctx.get("/api/messages").await.json();
    assert_eq!(first["page"], 1);
    assert_eq!(first["total"], 11);
    assert_eq!(first["pages"], 2);
    assert_eq!(first["items"].as_array().unwrap().len(), 10);

    let second: Value = ctx.get("/api/messages?page=2").await.json();
    assert_eq!(second["items"].as_array().unwrap().len(), 1);
    assert!(
        second["items"][0]["sent_at"].as_str().unwrap()
            < first["items"][9]["sent_at"].as_str().unwrap()
    );

    let clamped: Value = ctx.get("/api/messages?page=0").await.json();
    assert_eq!(clamped["page"], 1);
}

/// Two clients, one paid month (500.00 cash) and one sale (80.00 card)
async fn busy_month(ctx: &TestContext) {
    let ana = ctx.create_client("Ana", "ana@example.com", "Femenino").await;
    ctx.create_client("Luis", "luis@example.com", "Masculino").await;
    let monthly = ctx.create_service("Mensualidad", "mensual", "450").await;
    ctx.pay_membership(ana, monthly, "50", "Efectivo").await;

    let shake = ctx.create_product("Batido", "40.00", 5).await;
    ctx.sell(shake, 2, "Tarjeta").await;
}

#[tokio::test]
async fn test_summary() {
    let ctx = TestContext::new().await;
    busy_month(&ctx).await;

    let summary: Value = ctx.get("/api/statistics/summary").await.json();
    assert_eq!(summary["total_clients"], 2);
    assert_eq!(summary["active_memberships"], 1);
    assert_eq!(summary["new_clients"], 2);
    assert_eq!(summary["revenue_memberships"], "500.00");
    assert_eq!(summary["revenue_sales"], "80.00");
    assert_eq!(summary["revenue_total"], "580.00");

    let earlier: Value = ctx
        .get("/api/statistics/summary?from=2025-01-01&to=2025-05-31")
        .await
        .json();
    assert_eq!(earlier["revenue_total"], "0.00");
    assert_eq!(earlier["new_clients"], 0);
    assert_eq!(earlier["total_clients"], 2);

    let bad = ctx.get("/api/statistics/summary?from=junio").await;
    assert_eq!(bad.status_code(), 400);
}

#[tokio::test]
async fn test_monthly_revenue() {
    let ctx = TestContext::new().await;
    busy_month(&ctx).await;

    let chart: Value = ctx.get("/api/statistics/monthly-revenue").await.json();
    let labels = chart["labels"].as_array().unwrap();
    assert_eq!(labels.len(), 12);
    assert_eq!(labels[0], "Jul/24");
    assert_eq!(labels[11], "Jun/25");
    assert_eq!(chart["revenue"][10], "0.00");
    assert_eq!(chart["revenue"][11], "580.00");

    let inverted = ctx
        .get("/api/statistics/monthly-revenue?from=2025-06-10&to=2025-06-01")
        .await;
    assert_eq!(inverted.status_code(), 400);
}

#[tokio::test]
async fn test_distributions() {
    let ctx = TestContext::new().await;
    busy_month(&ctx).await;

    let gender: Value = ctx.get("/api/statistics/gender-distribution").await.json();
    assert_eq!(gender["labels"], json!(["Femenino", "Masculino"]));
    assert_eq!(gender["data"], json!([1, 1]));

    let status: Value = ctx.get("/api/statistics/client-status").await.json();
    assert_eq!(status["labels"], json!(["Activos", "Inactivos"]));
    assert_eq!(status["data"], json!([1, 1]));

    let ages: Value = ctx.get("/api/statistics/age-distribution").await.json();
    assert_eq!(ages["data"], json!([0, 2, 0, 0]));

    let services: Value = ctx.get("/api/statistics/service-distribution").await.json();
    assert_eq!(services["labels"], json!(["mensual"]));
    assert_eq!(services["data"], json!([1]));

    let anonymous = ctx.server.get("/api/statistics/summary").await;
    assert_eq!(anonymous.status_code(), 401);
}
