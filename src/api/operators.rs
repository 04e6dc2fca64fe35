//! Operator API endpoints

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};

use super::CurrentOperator;
use crate::error::AppResult;
use crate::models::operator::{Operator, OperatorInput};
use crate::AppState;

pub fn create_operator_routes() -> Router<AppState> {
    Router::new().route("/", get(list_operators).post(create_operator))
}

/// Open so the first operator can be created on an empty database
pub async fn create_operator(
    State(state): State<AppState>,
    Json(input): Json<OperatorInput>,
) -> AppResult<(StatusCode, Json<Operator>)> {
    let operator = state.operators.create(&input).await?;
    Ok((StatusCode::CREATED, Json(operator)))
}

pub async fn list_operators(
    State(state): State<AppState>,
    _operator: CurrentOperator,
) -> AppResult<Json<Vec<Operator>>> {
    Ok(Json(state.operators.list().await?))
}
