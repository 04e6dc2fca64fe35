//! Membership payment API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};

use super::CurrentOperator;
use crate::error::AppResult;
use crate::models::membership::{Membership, MembershipInput, PaymentReceipt};
use crate::AppState;

pub fn create_membership_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_memberships).post(record_payment))
        .route("/:id", get(get_membership))
}

pub async fn list_memberships(
    State(state): State<AppState>,
    _operator: CurrentOperator,
) -> AppResult<Json<Vec<Membership>>> {
    Ok(Json(state.memberships.list().await?))
}

/// Record a payment. The response says whether the confirmation email went out.
pub async fn record_payment(
    State(state): State<AppState>,
    CurrentOperator(operator): CurrentOperator,
    Json(input): Json<MembershipInput>,
) -> AppResult<(StatusCode, Json<PaymentReceipt>)> {
    let receipt = state.memberships.record_payment(&input, &operator).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn get_membership(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Path(id): Path<i64>,
) -> AppResult<Json<Membership>> {
    Ok(Json(state.memberships.get(id).await?))
}
