//! Door check-ins and the point of sale through the HTTP API

use serde_json::{json, Value};

use crate::test_utils::TestContext;

/// A client holding a current monthly membership
async fn member(ctx: &TestContext) -> i64 {
    let ana = ctx.create_client("Ana", "ana@example.com", "Femenino").await;
    let monthly = ctx.create_service("Mensualidad", "mensual", "450").await;
    ctx.pay_membership(ana, monthly, "0", "Efectivo").await;
    ana
}

#[tokio::test]
async fn test_check_in_once_per_day() {
    let ctx = TestContext::new().await;
    let ana = member(&ctx).await;

    let first = ctx
        .server
        .post("/api/attendance/check-in")
        .json(&json!({ "entry": ana.to_string() }))
        .await;
    assert_eq!(first.status_code(), 201);
    assert_eq!(first.json::<Value>()["client_name"], "Ana");

    ctx.clock.advance_hours(3);
    let again = ctx
        .server
        .post("/api/attendance/check-in")
        .json(&json!({ "entry": ana.to_string() }))
        .await;
    assert_eq!(again.status_code(), 409);

    // Next local day
    ctx.clock.advance_hours(21);
    let tomorrow = ctx
        .server
        .post("/api/attendance/check-in")
        .json(&json!({ "entry": format!(" {} ", ana) }))
        .await;
    assert_eq!(tomorrow.status_code(), 201);

    let history: Value = ctx.get("/api/attendance/history").await.json();
    assert_eq!(history.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_check_in_refusals() {
    let ctx = TestContext::new().await;
    let ana = member(&ctx).await;
    let luis = ctx.create_client("Luis", "luis@example.com", "Masculino").await;

    let unknown = ctx
        .server
        .post("/api/attendance/check-in")
        .json(&json!({ "entry": "999" }))
        .await;
    assert_eq!(unknown.status_code(), 404);

    let garbage = ctx
        .server
        .post("/api/attendance/check-in")
        .json(&json!({ "entry": "ana@example.com" }))
        .await;
    assert_eq!(garbage.status_code(), 404);

    let no_membership = ctx
        .server
        .post("/api/attendance/check-in")
        .json(&json!({ "entry": luis.to_string() }))
        .await;
    assert_eq!(no_membership.status_code(), 403);
    assert!(no_membership.text().contains("Luis"));

    // 23:00 local, after closing
    ctx.clock.advance_hours(13);
    let closed = ctx
        .server
        .post("/api/attendance/check-in")
        .json(&json!({ "entry": ana.to_string() }))
        .await;
    assert_eq!(closed.status_code(), 403);
    assert!(closed.text().contains("06:00 a 22:00"));

    let history: Value = ctx.get("/api/attendance/history").await.json();
    assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_validate_does_not_record() {
    let ctx = TestContext::new().await;
    let ana = member(&ctx).await;

    let check: Value = ctx
        .server
        .get(&format!("/api/attendance/validate/{}", ana))
        .await
        .json();
    assert_eq!(check["status"], "success");
    assert_eq!(check["client"]["name"], "Ana");

    let refused: Value = ctx.server.get("/api/attendance/validate/999").await.json();
    assert_eq!(refused["status"], "error");
    assert!(refused["client"].is_null());

    let history: Value = ctx.get("/api/attendance/history").await.json();
    assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cart_building() {
    let ctx = TestContext::new().await;
    let water = ctx.create_product("Agua", "15.00", 4).await;
    let bar = ctx.create_product("Barra", "22.50", 10).await;

    let quote: Value = ctx
        .post("/api/sales/cart/add")
        .json(&json!({ "cart": { "lines": [] }, "product_id": water, "quantity": 2 }))
        .await
        .json();
    assert_eq!(quote["total"], "30.00");

    let quote: Value = ctx
        .post("/api/sales/cart/add")
        .json(&json!({ "cart": quote["cart"], "product_id": bar, "quantity": 1 }))
        .await
        .json();
    let quote: Value = ctx
        .post("/api/sales/cart/add")
        .json(&json!({ "cart": quote["cart"], "product_id": water, "quantity": 1 }))
        .await
        .json();
    assert_eq!(quote["lines"].as_array().unwrap().len(), 2);
    assert_eq!(quote["lines"][0]["quantity"], 3);
    assert_eq!(quote["total"], "67.50");

    let too_many = ctx
        .post("/api/sales/cart/add")
        .json(&json!({ "cart": quote["cart"], "product_id": water, "quantity": 2 }))
        .await;
    assert_eq!(too_many.status_code(), 409);
    assert_eq!(too_many.json::<Value>()["error"], "InsufficientStock");

    let removed: Value = ctx
        .post("/api/sales/cart/remove")
        .json(&json!({ "cart": quote["cart"], "index": 0 }))
        .await
        .json();
    assert_eq!(removed["total"], "22.50");

    let out_of_range = ctx
        .post("/api/sales/cart/remove")
        .json(&json!({ "cart": removed["cart"], "index": 4 }))
        .await;
    assert_eq!(out_of_range.status_code(), 400);

    let empty: Value = ctx.post("/api/sales/quote").json(&json!({ "lines": [] })).await.json();
    assert_eq!(empty["total"], "0.00");
}

#[tokio::test]
async fn test_confirmed_sale_takes_stock() {
    let ctx = TestContext::new().await;
    let water = ctx.create_product("Agua", "15.00", 4).await;

    let receipt = ctx.sell(water, 3, "Tarjeta").await;
    assert_eq!(receipt["total"], "45.00");
    assert_eq!(receipt["payment_method"], "Tarjeta");
    assert_eq!(receipt["operator_id"], ctx.operator_id);
    assert_eq!(receipt["lines"][0]["unit_price"], "15.00");

    let product: Value = ctx.get(&format!("/api/products/{}", water)).await.json();
    assert_eq!(product["stock"], 1);

    // Split across two lines, the merged quantity still exceeds stock
    let oversold = ctx
        .post("/api/sales")
        .json(&json!({
            "lines": [
                { "product_id": water, "quantity": 1 },
                { "product_id": water, "quantity": 1 }
            ],
            "payment_method": "Efectivo"
        }))
        .await;
    assert_eq!(oversold.status_code(), 409);

    let product: Value = ctx.get(&format!("/api/products/{}", water)).await.json();
    assert_eq!(product["stock"], 1);

    let history: Value = ctx.get("/api/sales").await.json();
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_sale_rejections() {
    let ctx = TestContext::new().await;

    let empty = ctx
        .post("/api/sales")
        .json(&json!({ "lines": [], "payment_method": "Efectivo" }))
        .await;
    assert_eq!(empty.status_code(), 400);
    assert_eq!(empty.json::<Value>()["error"], "EmptyCart");

    let unknown = ctx
        .post("/api/sales")
        .json(&json!({ "lines": [{ "product_id": 77, "quantity": 1 }] }))
        .await;
    assert_eq!(unknown.status_code(), 404);

    let anonymous = ctx
        .server
        .post("/api/sales")
        .json(&json!({ "lines": [{ "product_id": 77, "quantity": 1 }] }))
        .await;
    assert_eq!(anonymous.status_code(), 401);
}

#[tokio::test]
async fn test_receipt_survives_product_deletion() {
    let ctx = TestContext::new().await;
    let water = ctx.create_product("Agua", "15.00", 4).await;
    let receipt = ctx.sell(water, 2, "Efectivo").await;

    assert_eq!(ctx.delete(&format!("/api/products/{}", water)).await.status_code(), 204);

    let stored: Value = ctx
        .get(&format!("/api/sales/{}/receipt", receipt["id"]))
        .await
        .json();
    assert_eq!(stored["total"], "30.00");
    assert_eq!(stored["lines"][0]["name"], "Producto eliminado");
    assert!(stored["lines"][0]["product_id"].is_null());
    assert_eq!(stored["lines"][0]["subtotal"], "30.00");

    assert_eq!(ctx.get("/api/sales/999/receipt").await.status_code(), 404);
}

#[tokio::test]
async fn test_product_catalog_and_search() {
    let ctx = TestContext::new().await;
    ctx.create_product("Agua natural", "15.00", 4).await;

    let duplicate = ctx
        .post("/api/products")
        .json(&json!({ "name": "Agua natural", "price": "12", "stock": 1 }))
        .await;
    assert_eq!(duplicate.status_code(), 409);

    let free = ctx
        .post("/api/products")
        .json(&json!({ "name": "Toalla", "price": "0", "stock": 1 }))
        .await;
    assert_eq!(free.status_code(), 400);

    let found: Value = ctx.get("/api/sales/search-product?q=AGUA").await.json();
    assert_eq!(found["name"], "Agua natural");

    let missing: Value = ctx.get("/api/sales/search-product?q=proteina").await.json();
    assert!(missing.is_null());

    let public = ctx.server.get("/api/products/public").await;
    assert_eq!(public.status_code(), 200);
    assert_eq!(public.json::<Value>().as_array().unwrap().len(), 1);
}
