//! Dashboard statistics API endpoints

use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};

use super::CurrentOperator;
use crate::error::AppResult;
use crate::models::statistics::{DateRangeQuery, Distribution, MonthlyRevenue, Summary};
use crate::AppState;

pub fn create_statistics_routes() -> Router<AppState> {
    Router::new()
        .route("/summary", get(summary))
        .route("/monthly-revenue", get(monthly_revenue))
        .route("/age-distribution", get(age_distribution))
        .route("/service-distribution", get(service_distribution))
        .route("/client-status", get(client_status))
        .route("/gender-distribution", get(gender_distribution))
}

pub async fn summary(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Query(range): Query<DateRangeQuery>,
) -> AppResult<Json<Summary>> {
    Ok(Json(state.statistics.summary(&range).await?))
}

pub async fn monthly_revenue(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Query(range): Query<DateRangeQuery>,
) -> AppResult<Json<MonthlyRevenue>> {
    Ok(Json(state.statistics.monthly_revenue(&range).await?))
}

pub async fn age_distribution(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Query(range): Query<DateRangeQuery>,
) -> AppResult<Json<Distribution>> {
    Ok(Json(state.statistics.age_distribution(&range).await?))
}

pub async fn service_distribution(
    State(state): State<AppState>,
    _operator: CurrentOperator,
) -> AppResult<Json<Distribution>> {
    Ok(Json(state.statistics.service_distribution().await?))
}

pub async fn client_status(
    State(state): State<AppState>,
    _operator: CurrentOperator,
) -> AppResult<Json<Distribution>> {
    Ok(Json(state.statistics.client_status().await?))
}

pub async fn gender_distribution(
    State(state): State<AppState>,
    _operator: CurrentOperator,
) -> AppResult<Json<Distribution>> {
    Ok(Json(state.statistics.gender_distribution().await?))
}
