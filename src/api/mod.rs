//! API module for gym-desk
//!
//! Contains all REST API endpoints and routing.

pub mod attendance;
pub mod catalog;
pub mod clients;
pub mod memberships;
pub mod messages;
pub mod operators;
pub mod products;
pub mod reconciliation;
pub mod sales;
pub mod statistics;

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderName, HeaderValue, Method, Request, Response},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::{ServeDir, ServeFile},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{warn, Span};

use crate::error::{AppError, AppResult};
use crate::models::operator::Operator;
use crate::request_span;
use crate::AppState;

/// Header naming the operator a back-office request acts for
pub const OPERATOR_HEADER: &str = "x-operator-id";

/// The operator named by `X-Operator-Id`. Missing, malformed or unknown ids are 401.
#[derive(Debug, Clone)]
pub struct CurrentOperator(pub Operator);

#[async_trait]
impl FromRequestParts<AppState> for CurrentOperator {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(OPERATOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<i64>().ok())
            .ok_or(AppError::Unauthorized)?;

        state
            .operators
            .find(id)
            .await?
            .map(CurrentOperator)
            .ok_or(AppError::Unauthorized)
    }
}

/// Database round-trip
pub async fn health(State(state): State<AppState>) -> AppResult<Json<Value>> {
    state.database.test_connection().await.map_err(|err| {
        warn!(error = %err, "Health check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "db_connections": state.database.pool_size(),
    })))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(OPERATOR_HEADER)]);

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(allowed))
    }
}

/// All API routes under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/operators", operators::create_operator_routes())
        .nest("/clients", clients::create_client_routes())
        .nest("/services", catalog::create_catalog_routes())
        .nest("/memberships", memberships::create_membership_routes())
        .nest("/attendance", attendance::create_attendance_routes())
        .nest("/products", products::create_product_routes())
        .nest("/sales", sales::create_sales_routes())
        .nest("/reconciliation", reconciliation::create_reconciliation_routes())
        .nest("/statistics", statistics::create_statistics_routes())
        .nest("/messages", messages::create_message_routes())
}

/// The full application: API, static frontend and middleware
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let mut app = Router::new().nest("/api", api_routes());

    if config.frontend_dir.is_dir() {
        let index = config.frontend_dir.join("index.html");
        app = app.fallback_service(ServeDir::new(&config.frontend_dir).fallback(ServeFile::new(index)));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(|request: &Request<Body>| {
                        request_span!(request.method(), request.uri().path())
                    })
                    .on_response(|response: &Response<Body>, latency: Duration, span: &Span| {
                        span.record("status_code", response.status().as_u16());
                        span.record("duration_ms", latency.as_millis() as u64);
                        tracing::debug!("Request completed");
                    }),
            )
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout)))
            .layer(cors_layer(&config.cors_origins)),
    )
    .with_state(state)
}
