//! Point-of-sale API endpoints
//!
//! The terminal owns the cart and posts it with each call; nothing is stored until the
//! sale is confirmed.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};

use super::CurrentOperator;
use crate::error::AppResult;
use crate::models::client::SearchQuery;
use crate::models::product::Product;
use crate::models::sale::{AddToCart, Cart, Quote, Receipt, RemoveFromCart, Sale, SaleRequest};
use crate::AppState;

pub fn create_sales_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(sales_history).post(confirm_sale))
        .route("/search-product", get(search_product))
        .route("/quote", post(quote_cart))
        .route("/cart/add", post(add_to_cart))
        .route("/cart/remove", post(remove_from_cart))
        .route("/:id/receipt", get(sale_receipt))
}

pub async fn search_product(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Option<Product>>> {
    Ok(Json(state.sales.search_product(&query.q).await?))
}

pub async fn quote_cart(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Json(cart): Json<Cart>,
) -> AppResult<Json<Quote>> {
    Ok(Json(state.sales.quote(cart).await?))
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Json(request): Json<AddToCart>,
) -> AppResult<Json<Quote>> {
    Ok(Json(state.sales.add_to_cart(request).await?))
}

pub async fn remove_from_cart(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Json(request): Json<RemoveFromCart>,
) -> AppResult<Json<Quote>> {
    Ok(Json(state.sales.remove_from_cart(request).await?))
}

pub async fn confirm_sale(
    State(state): State<AppState>,
    CurrentOperator(operator): CurrentOperator,
    Json(request): Json<SaleRequest>,
) -> AppResult<(StatusCode, Json<Receipt>)> {
    let receipt = state.sales.confirm(&request, &operator).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn sale_receipt(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Path(id): Path<i64>,
) -> AppResult<Json<Receipt>> {
    Ok(Json(state.sales.receipt(id).await?))
}

pub async fn sales_history(
    State(state): State<AppState>,
    _operator: CurrentOperator,
) -> AppResult<Json<Vec<Sale>>> {
    Ok(Json(state.sales.history().await?))
}
