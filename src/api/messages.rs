//! Bulk message API endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};

use super::CurrentOperator;
use crate::error::AppResult;
use crate::models::mass_message::{HistoryQuery, MassMessage, MassMessageRequest, MessagePage};
use crate::AppState;

pub fn create_message_routes() -> Router<AppState> {
    Router::new().route("/", get(message_history).post(send_message))
}

pub async fn send_message(
    State(state): State<AppState>,
    CurrentOperator(operator): CurrentOperator,
    Json(request): Json<MassMessageRequest>,
) -> AppResult<(StatusCode, Json<MassMessage>)> {
    let message = state.messaging.send(&request, &operator).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn message_history(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<MessagePage>> {
    Ok(Json(state.messaging.history(query.page()).await?))
}
