use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Duration;
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    middleware::auth::Principal,
    models::user::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, UserResponse},
    state::AppState,
    utils::cookies::{access_cookie, clear_access_cookie},
    validation::Validate,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenStatus {
    pub valid: bool,
    pub email: Option<String>,
    pub roles: Vec<String>,
}

fn with_access_cookie(state: &AppState, response: AuthResponse) -> impl IntoResponse {
    let cookie = access_cookie(
        &response.token,
        Duration::milliseconds(response.expires_in),
        state.cookie_options(),
    );
    ([(header::SET_COOKIE, cookie)], Json(response))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let response = state
        .auth
        .authenticate(&payload.email, &payload.password)
        .await?;
    Ok(with_access_cookie(&state, response))
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = state.auth.register(payload, Vec::new()).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth.refresh(&payload.refresh_token).await?;
    Ok(with_access_cookie(&state, response))
}

/// Tokens are stateless; logging out only drops the browser cookie.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, clear_access_cookie(state.cookie_options()))],
        Json(json!({ "message": "Logged out successfully" })),
    )
}

pub async fn me(principal: Principal) -> Json<UserResponse> {
    Json(UserResponse::from(principal.user))
}

pub async fn validate_token(request: Request) -> Json<TokenStatus> {
    let status = match request.extensions().get::<Principal>() {
        Some(principal) => TokenStatus {
            valid: true,
            email: Some(principal.user.email.clone()),
            roles: principal.user.role_names(),
        },
        None => TokenStatus {
            valid: false,
            email: None,
            roles: Vec::new(),
        },
    };
    Json(status)
}
