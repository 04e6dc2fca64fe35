//! Product API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};

use super::CurrentOperator;
use crate::error::AppResult;
use crate::models::product::{Product, ProductInput};
use crate::AppState;

pub fn create_product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/public", get(public_products))
        .route("/:id", get(get_product).put(update_product).delete(delete_product))
}

/// Catalog for the public storefront, no operator needed
pub async fn public_products(State(state): State<AppState>) -> AppResult<Json<Vec<Product>>> {
    Ok(Json(state.products.list().await?))
}

pub async fn list_products(
    State(state): State<AppState>,
    _operator: CurrentOperator,
) -> AppResult<Json<Vec<Product>>> {
    Ok(Json(state.products.list().await?))
}

pub async fn create_product(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Json(input): Json<ProductInput>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let product = state.products.create(&input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get_product(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Path(id): Path<i64>,
) -> AppResult<Json<Product>> {
    Ok(Json(state.products.get(id).await?))
}

pub async fn update_product(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Path(id): Path<i64>,
    Json(input): Json<ProductInput>,
) -> AppResult<Json<Product>> {
    Ok(Json(state.products.update(id, &input).await?))
}

pub async fn delete_product(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.products.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
