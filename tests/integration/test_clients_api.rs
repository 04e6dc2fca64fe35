//! Clients, service catalog and membership payments through the HTTP API

use serde_json::{json, Value};

use crate::test_utils::TestContext;

#[tokio::test]
async fn test_client_registration_and_validation() {
    let ctx = TestContext::new().await;

    let client = ctx
        .create(
            "/api/clients",
            json!({
                "name": "Ana López",
                "email": "Ana@Example.com",
                "phone": "5512345678",
                "sex": "Femenino",
                "age": "29"
            }),
        )
        .await;
    assert_eq!(client["email"], "ana@example.com");
    assert_eq!(client["age"], 29);

    let duplicate = ctx
        .post("/api/clients")
        .json(&json!({
            "name": "Otra Ana",
            "email": "ana@example.com",
            "phone": "5599999999",
            "sex": "Femenino"
        }))
        .await;
    assert_eq!(duplicate.status_code(), 409);

    let bad_age = ctx
        .post("/api/clients")
        .json(&json!({
            "name": "Luis",
            "email": "luis@example.com",
            "phone": "5511111111",
            "sex": "Masculino",
            "age": "treinta"
        }))
        .await;
    assert_eq!(bad_age.status_code(), 400);
}

#[tokio::test]
async fn test_client_update_keeps_emails_unique() {
    let ctx = TestContext::new().await;
    let ana = ctx.create_client("Ana", "ana@example.com", "Femenino").await;
    ctx.create_client("Luis", "luis@example.com", "Masculino").await;

    let taken = ctx
        .put(&format!("/api/clients/{}", ana))
        .json(&json!({ "name": "Ana", "email": "luis@example.com", "phone": "1" }))
        .await;
    assert_eq!(taken.status_code(), 409);

    let updated = ctx
        .put(&format!("/api/clients/{}", ana))
        .json(&json!({ "name": "Ana María", "email": "ana@example.com", "phone": "2" }))
        .await;
    assert_eq!(updated.status_code(), 200);
    assert_eq!(updated.json::<Value>()["name"], "Ana María");

    let missing = ctx
        .put("/api/clients/999")
        .json(&json!({ "name": "X", "email": "x@example.com", "phone": "3" }))
        .await;
    assert_eq!(missing.status_code(), 404);
}

#[tokio::test]
async fn test_client_search() {
    let ctx = TestContext::new().await;
    let ana = ctx.create_client("Ana López", "ana@example.com", "Femenino").await;
    ctx.create_client("Luis Pérez", "luis@example.com", "Masculino").await;

    let by_name: Value = ctx.get("/api/clients/search?q=l%C3%B3p").await.json();
    assert_eq!(by_name.as_array().unwrap().len(), 1);
    assert_eq!(by_name[0]["id"], ana);

    let by_email: Value = ctx.get("/api/clients/search?q=LUIS@").await.json();
    assert_eq!(by_email[0]["name"], "Luis Pérez");

    let by_id: Value = ctx.get(&format!("/api/clients/search?q={}", ana)).await.json();
    assert_eq!(by_id[0]["id"], ana);

    let nothing: Value = ctx.get("/api/clients/search?q=zzz").await.json();
    assert!(nothing.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_status_and_detail_follow_memberships() {
    let ctx = TestContext::new().await;
    let ana = ctx.create_client("Ana", "ana@example.com", "Femenino").await;
    ctx.create_client("Luis", "luis@example.com", "Masculino").await;
    let weekly = ctx.create_service("Semana", "semanal", "150.00").await;
    ctx.pay_membership(ana, weekly, "", "Efectivo").await;

    let list: Value = ctx.get("/api/clients").await.json();
    let list = list.as_array().unwrap();
    assert_eq!(list[0]["name"], "Ana");
    assert_eq!(list[0]["status"], "Activo");
    assert_eq!(list[1]["status"], "Inactivo");

    let detail: Value = ctx.get(&format!("/api/clients/{}", ana)).await.json();
    assert_eq!(detail["status"], "Activo");
    assert_eq!(detail["current_service"]["service_name"], "Semana");
    assert_eq!(detail["current_service"]["service_type"], "semanal");
    assert_eq!(detail["memberships"].as_array().unwrap().len(), 1);

    // The week runs out
    ctx.clock.advance_days(8);
    let detail: Value = ctx.get(&format!("/api/clients/{}", ana)).await.json();
    assert_eq!(detail["status"], "Inactivo");
    assert!(detail["current_service"].is_null());
}

#[tokio::test]
async fn test_deleting_a_client_keeps_payment_history() {
    let ctx = TestContext::new().await;
    let ana = ctx.create_client("Ana", "ana@example.com", "Femenino").await;
    let monthly = ctx.create_service("Mensualidad", "mensual", "450").await;
    let paid = ctx.pay_membership(ana, monthly, "0", "Efectivo").await;

    let deleted = ctx.delete(&format!("/api/clients/{}", ana)).await;
    assert_eq!(deleted.status_code(), 204);
    assert_eq!(ctx.get(&format!("/api/clients/{}", ana)).await.status_code(), 404);

    let membership: Value = ctx
        .get(&format!("/api/memberships/{}", paid["membership"]["id"]))
        .await
        .json();
    assert!(membership["client_id"].is_null());
    assert_eq!(membership["total"], "450.00");
}

#[tokio::test]
async fn test_service_catalog() {
    let ctx = TestContext::new().await;

    let unknown = ctx
        .post("/api/services")
        .json(&json!({ "name": "Década", "service_type": "decenal", "cost": 1 }))
        .await;
    assert_eq!(unknown.status_code(), 400);

    let negative = ctx
        .post("/api/services")
        .json(&json!({ "name": "Gratis", "service_type": "diaria", "cost": -1 }))
        .await;
    assert_eq!(negative.status_code(), 400);

    let day = ctx.create_service("Visita", "diaria", "60").await;
    let updated = ctx
        .put(&format!("/api/services/{}", day))
        .json(&json!({ "name": "Visita", "service_type": "Diaria", "cost": "65.5" }))
        .await;
    assert_eq!(updated.json::<Value>()["cost"], "65.50");

    let services: Value = ctx.get("/api/services").await.json();
    assert_eq!(services.as_array().unwrap().len(), 1);

    // A service with payments on record stays
    let ana = ctx.create_client("Ana", "ana@example.com", "Femenino").await;
    ctx.pay_membership(ana, day, "0", "Tarjeta").await;
    assert_eq!(ctx.delete(&format!("/api/services/{}", day)).await.status_code(), 409);

    let unused = ctx.create_service("Año", "anual", "4000").await;
    assert_eq!(ctx.delete(&format!("/api/services/{}", unused)).await.status_code(), 204);
}

#[tokio::test]
async fn test_membership_payment_and_renewal() {
    let ctx = TestContext::new().await;
    let ana = ctx.create_client("Ana", "ana@example.com", "Femenino").await;
    let monthly = ctx.create_service("Mensualidad", "mensual", "450.00").await;

    let first = ctx.pay_membership(ana, monthly, "50", "Efectivo").await;
    assert_eq!(first["notification_sent"], true);
    assert_eq!(first["membership"]["total"], "500.00");
    assert_eq!(first["membership"]["starts_at"], "2025-06-02T16:00:00Z");
    assert_eq!(first["membership"]["ends_at"], "2025-07-02T16:00:00Z");

    let sent = ctx.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ana@example.com");
    assert!(sent[0].body.contains("Mensualidad"));
    assert!(sent[0].body.contains("$500.00"));

    // Renewed early: the new month starts the day after the current one ends
    ctx.clock.advance_days(10);
    let renewal = ctx.pay_membership(ana, monthly, "0", "Tarjeta").await;
    assert_eq!(renewal["membership"]["starts_at"], "2025-07-03T16:00:00Z");
    assert_eq!(renewal["membership"]["ends_at"], "2025-08-03T16:00:00Z");

    let old: Value = ctx
        .get(&format!("/api/memberships/{}", first["membership"]["id"]))
        .await
        .json();
    assert_eq!(old["active"], false);

    let payments: Value = ctx.get("/api/memberships").await.json();
    assert_eq!(payments[0]["id"], renewal["membership"]["id"]);

    let unknown_service = ctx
        .post("/api/memberships")
        .json(&json!({ "client_id": ana, "service_id": 999 }))
        .await;
    assert_eq!(unknown_service.status_code(), 404);
}

#[tokio::test]
async fn test_payment_survives_a_mail_failure() {
    let ctx = TestContext::with_mailer(gym_desk::services::mailer::RecordingMailer::failing_after(0)).await;
    let ana = ctx.create_client("Ana", "ana@example.com", "Femenino").await;
    let monthly = ctx.create_service("Mensualidad", "mensual", "450.00").await;

    let receipt = ctx.pay_membership(ana, monthly, "0", "Efectivo").await;
    assert_eq!(receipt["notification_sent"], false);

    let payments: Value = ctx.get("/api/memberships").await.json();
    assert_eq!(payments.as_array().unwrap().len(), 1);
}
