//! Client API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};

use super::CurrentOperator;
use crate::error::AppResult;
use crate::models::client::{Client, ClientDetail, ClientInput, ClientSummary, ClientUpdate, SearchQuery};
use crate::AppState;

pub fn create_client_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_clients).post(create_client))
        .route("/search", get(search_clients))
        .route("/:id", get(get_client).put(update_client).delete(delete_client))
}

pub async fn list_clients(
    State(state): State<AppState>,
    _operator: CurrentOperator,
) -> AppResult<Json<Vec<ClientSummary>>> {
    Ok(Json(state.clients.list().await?))
}

pub async fn create_client(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Json(input): Json<ClientInput>,
) -> AppResult<(StatusCode, Json<Client>)> {
    let client = state.clients.create(&input).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn search_clients(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Client>>> {
    Ok(Json(state.clients.search(&query.q).await?))
}

pub async fn get_client(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Path(id): Path<i64>,
) -> AppResult<Json<ClientDetail>> {
    Ok(Json(state.clients.detail(id).await?))
}

pub async fn update_client(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Path(id): Path<i64>,
    Json(update): Json<ClientUpdate>,
) -> AppResult<Json<Client>> {
    Ok(Json(state.clients.update(id, &update).await?))
}

pub async fn delete_client(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.clients.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
