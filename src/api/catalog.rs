//! Service catalog API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};

use super::CurrentOperator;
use crate::error::AppResult;
use crate::models::service::{Service, ServiceInput};
use crate::AppState;

pub fn create_catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_services).post(create_service))
        .route("/:id", get(get_service).put(update_service).delete(delete_service))
}

pub async fn list_services(
    State(state): State<AppState>,
    _operator: CurrentOperator,
) -> AppResult<Json<Vec<Service>>> {
    Ok(Json(state.catalog.list().await?))
}

pub async fn create_service(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Json(input): Json<ServiceInput>,
) -> AppResult<(StatusCode, Json<Service>)> {
    let service = state.catalog.create(&input).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

pub async fn get_service(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Path(id): Path<i64>,
) -> AppResult<Json<Service>> {
    Ok(Json(state.catalog.get(id).await?))
}

pub async fn update_service(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Path(id): Path<i64>,
    Json(input): Json<ServiceInput>,
) -> AppResult<Json<Service>> {
    Ok(Json(state.catalog.update(id, &input).await?))
}

pub async fn delete_service(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.catalog.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
