//! Integration Test Utilities
//!
//! Full application over an in-memory database, with a settable clock and a mailer
//! that records instead of sending.

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestRequest, TestServer};
use chrono_tz::America::Mexico_City;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use gym_desk::config::Config;
use gym_desk::database::DatabaseManager;
use gym_desk::services::mailer::RecordingMailer;
use gym_desk::services::MockTimeProvider;
use gym_desk::{build_router, AppState};

/// Test context with full application setup
pub struct TestContext {
    pub server: TestServer,
    pub pool: SqlitePool,
    pub clock: Arc<MockTimeProvider>,
    pub mailer: Arc<RecordingMailer>,
    pub operator_id: i64,
}

impl TestContext {
    /// Monday 2 June 2025, 10:00 in Mexico City, gym open 06:00-22:00
    pub async fn new() -> Self {
        Self::with_mailer(RecordingMailer::new()).await
    }

    pub async fn with_mailer(mailer: RecordingMailer) -> Self {
        let database = DatabaseManager::in_memory().await.expect("in-memory database");
        database.migrate().await.expect("migrations");
        let pool = database.pool.clone();

        let clock = Arc::new(
            MockTimeProvider::at_local(Mexico_City, 2025, 6, 2, 10, 0).expect("valid local time"),
        );
        let mailer = Arc::new(mailer);

        let config = Config {
            frontend_dir: "/nonexistent/gym-desk-frontend".into(),
            ..Config::default()
        };
        let state = AppState::new(config, database, clock.clone(), mailer.clone());
        let server = TestServer::new(build_router(state)).expect("test server");

        let response = server
            .post("/api/operators")
            .json(&json!({ "username": "recepcion", "role": "staff" }))
            .await;
        assert_eq!(response.status_code(), 201);
        let operator_id = response.json::<Value>()["id"].as_i64().expect("operator id");

        Self {
            server,
            pool,
            clock,
            mailer,
            operator_id,
        }
    }

    fn as_operator(&self, request: TestRequest) -> TestRequest {
        request.add_header(
            HeaderName::from_static("x-operator-id"),
            HeaderValue::from_str(&self.operator_id.to_string()).expect("header value"),
        )
    }

    pub fn get(&self, path: &str) -> TestRequest {
        self.as_operator(self.server.get(path))
    }

    pub fn post(&self, path: &str) -> TestRequest {
        self.as_operator(self.server.post(path))
    }

    pub fn put(&self, path: &str) -> TestRequest {
        self.as_operator(self.server.put(path))
    }

    pub fn delete(&self, path: &str) -> TestRequest {
        self.as_operator(self.server.delete(path))
    }

    /// POST and return the created resource's JSON, asserting 201
    pub async fn create(&self, path: &str, body: Value) -> Value {
        let response = self.post(path).json(&body).await;
        assert_eq!(response.status_code(), 201, "POST {} failed: {}", path, response.text());
        response.json::<Value>()
    }

    pub async fn create_client(&self, name: &str, email: &str, sex: &str) -> i64 {
        let client = self
            .create(
                "/api/clients",
                json!({
                    "name": name,
                    "email": email,
                    "phone": "5512345678",
                    "sex": sex,
                    "age": 30
                }),
            )
            .await;
        client["id"].as_i64().expect("client id")
    }

    pub async fn create_service(&self, name: &str, service_type: &str, cost: &str) -> i64 {
        let service = self
            .create(
                "/api/services",
                json!({ "name": name, "service_type": service_type, "cost": cost }),
            )
            .await;
        service["id"].as_i64().expect("service id")
    }

    pub async fn create_product(&self, name: &str, price: &str, stock: i64) -> i64 {
        let product = self
            .create(
                "/api/products",
                json!({ "name": name, "price": price, "stock": stock }),
            )
            .await;
        product["id"].as_i64().expect("product id")
    }

    /// Pay a membership and return the response body
    pub async fn pay_membership(
        &self,
        client_id: i64,
        service_id: i64,
        fee: &str,
        payment_method: &str,
    ) -> Value {
        self.create(
            "/api/memberships",
            json!({
                "client_id": client_id,
                "service_id": service_id,
                "enrollment_fee": fee,
                "payment_method": payment_method
            }),
        )
        .await
    }

    /// Ring up a one-line sale
    pub async fn sell(&self, product_id: i64, quantity: i64, payment_method: &str) -> Value {
        self.create(
            "/api/sales",
            json!({
                "lines": [{ "product_id": product_id, "quantity": quantity }],
                "payment_method": payment_method
            }),
        )
        .await
    }
}
