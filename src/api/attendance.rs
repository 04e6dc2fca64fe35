//! Door check-in API endpoints. Check-in and validation are open to the door terminal.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};

use super::CurrentOperator;
use crate::error::AppResult;
use crate::models::attendance::{AccessCheck, Attendance, CheckInRequest};
use crate::AppState;

pub fn create_attendance_routes() -> Router<AppState> {
    Router::new()
        .route("/check-in", post(check_in))
        .route("/validate/:entry", get(validate_entry))
        .route("/history", get(attendance_history))
}

pub async fn check_in(
    State(state): State<AppState>,
    Json(request): Json<CheckInRequest>,
) -> AppResult<(StatusCode, Json<Attendance>)> {
    let attendance = state.attendance.check_in(&request.entry).await?;
    Ok((StatusCode::CREATED, Json(attendance)))
}

pub async fn validate_entry(
    State(state): State<AppState>,
    Path(entry): Path<String>,
) -> AppResult<Json<AccessCheck>> {
    Ok(Json(state.attendance.validate(&entry).await?))
}

pub async fn attendance_history(
    State(state): State<AppState>,
    _operator: CurrentOperator,
) -> AppResult<Json<Vec<Attendance>>> {
    Ok(Json(state.attendance.history().await?))
}
