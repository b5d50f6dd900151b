use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppError,
    middleware::auth::AdminPrincipal,
    models::{
        user::{RoleRequest, UserResponse, UserRole},
        PaginatedResponse, PaginationQuery,
    },
    state::AppState,
    types::UserId,
};

pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PaginatedResponse<UserResponse>>, AppError> {
    Ok(Json(state.users.list(&query).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
    Path(id): Path<UserId>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.users.find(id).await?;
    Ok(Json(user.into()))
}

pub async fn activate_user(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
    Path(id): Path<UserId>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.users.set_active(id, true).await?;
    Ok(Json(user.into()))
}

pub async fn deactivate_user(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
    Path(id): Path<UserId>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.users.set_active(id, false).await?;
    Ok(Json(user.into()))
}

pub async fn add_role(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
    Path(id): Path<UserId>,
    Json(payload): Json<RoleRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.users.add_role(id, payload.role).await?;
    Ok(Json(user.into()))
}

pub async fn remove_role(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
    Path((id, role)): Path<(UserId, String)>,
) -> Result<Json<UserResponse>, AppError> {
    let role = UserRole::parse(&role)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown role: {}", role)))?;
    let user = state.users.remove_role(id, role).await?;
    Ok(Json(user.into()))
}

pub async fn delete_user(
    State(state): State<AppState>,
    AdminPrincipal(admin): AdminPrincipal,
    Path(id): Path<UserId>,
) -> Result<StatusCode, AppError> {
    if admin.user.id == id {
        return Err(AppError::BadRequest(
            "Administrators cannot delete their own account".to_string(),
        ));
    }
    state.users.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
