use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppError, models::product::Product, repositories::product as product_repo,
    state::AppState, types::ProductId,
};

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>, AppError> {
    let product = product_repo::find_purchasable(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found or unavailable".to_string()))?;
    Ok(Json(product))
}
