use axum::{extract::State, Json};

use crate::{
    error::AppError,
    middleware::auth::Principal,
    models::user::{UpdateProfileRequest, UserResponse},
    state::AppState,
};

pub async fn get_me(principal: Principal) -> Json<UserResponse> {
    Json(UserResponse::from(principal.user))
}

pub async fn update_me(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let updated = state.users.update_profile(&principal.user, payload).await?;
    Ok(Json(UserResponse::from(updated)))
}
