use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::AppError,
    middleware::auth::Principal,
    models::cart::{AddCartItemRequest, CartCountResponse, CartResponse, QuantityQuery},
    state::AppState,
    types::CartLineId,
};

pub async fn get_cart(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<CartResponse>, AppError> {
    let cart = state.carts.get_or_create(&principal.user).await?;
    Ok(Json(cart.into()))
}

pub async fn count_items(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<CartCountResponse>, AppError> {
    let count = state.carts.item_count(&principal.user).await?;
    Ok(Json(CartCountResponse { count }))
}

pub async fn add_item(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<AddCartItemRequest>,
) -> Result<Json<CartResponse>, AppError> {
    let cart = state
        .carts
        .add_line(&principal.user, payload.product_id, payload.quantity)
        .await?;
    Ok(Json(cart.into()))
}

pub async fn update_item(
    State(state): State<AppState>,
    principal: Principal,
    Path(line_id): Path<CartLineId>,
    Query(query): Query<QuantityQuery>,
) -> Result<Json<CartResponse>, AppError> {
    let cart = state
        .carts
        .update_quantity(&principal.user, line_id, query.quantity)
        .await?;
    Ok(Json(cart.into()))
}

pub async fn remove_item(
    State(state): State<AppState>,
    principal: Principal,
    Path(line_id): Path<CartLineId>,
) -> Result<Json<CartResponse>, AppError> {
    let cart = state.carts.remove_line(&principal.user, line_id).await?;
    Ok(Json(cart.into()))
}

pub async fn clear_cart(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<CartResponse>, AppError> {
    let cart = state.carts.clear(&principal.user).await?;
    Ok(Json(cart.into()))
}

pub async fn checkout(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<CartResponse>, AppError> {
    let cart = state.carts.checkout(&principal.user).await?;
    Ok(Json(cart.into()))
}
