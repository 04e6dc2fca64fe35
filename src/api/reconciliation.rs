//! Register reconciliation API endpoints

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};

use super::CurrentOperator;
use crate::error::AppResult;
use crate::models::cash_closing::{CashClosing, CloseRegisterRequest, ClosingPreview, ClosingReport};
use crate::AppState;

pub fn create_reconciliation_routes() -> Router<AppState> {
    Router::new()
        .route("/preview", get(closing_preview))
        .route("/close", post(close_register))
        .route("/history", get(closing_history))
}

/// Takings since the last closing, the float and the cash the drawer should hold
pub async fn closing_preview(
    State(state): State<AppState>,
    _operator: CurrentOperator,
) -> AppResult<Json<ClosingPreview>> {
    Ok(Json(state.reconciliation.preview().await?))
}

/// Close the register. A missing or unreadable body counts as a missing amount.
pub async fn close_register(
    State(state): State<AppState>,
    CurrentOperator(operator): CurrentOperator,
    request: Option<Json<CloseRegisterRequest>>,
) -> AppResult<(StatusCode, Json<ClosingReport>)> {
    let counted_cash = request.and_then(|Json(request)| request.counted_cash);
    let report = state
        .reconciliation
        .close_register(counted_cash.as_ref(), &operator)
        .await?;
    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn closing_history(
    State(state): State<AppState>,
    _operator: CurrentOperator,
) -> AppResult<Json<Vec<CashClosing>>> {
    Ok(Json(state.reconciliation.history().await?))
}
