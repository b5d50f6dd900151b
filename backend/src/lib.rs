pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;
pub mod state;
pub mod types;
pub mod utils;
pub mod validation;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

/// Builds the full application router. The authorizer runs in front of every
/// route, including the docs.
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/me", get(handlers::auth::me))
        .route(
            "/api/auth/validate-token",
            get(handlers::auth::validate_token),
        );

    let cart_routes = Router::new()
        .route("/api/cart", get(handlers::cart::get_cart))
        .route("/api/cart/count", get(handlers::cart::count_items))
        .route("/api/cart/items", post(handlers::cart::add_item))
        .route(
            "/api/cart/items/{id}",
            put(handlers::cart::update_item).delete(handlers::cart::remove_item),
        )
        .route("/api/cart/clear", post(handlers::cart::clear_cart))
        .route("/api/cart/checkout", post(handlers::cart::checkout));

    let user_routes = Router::new()
        .route("/api/products/{id}", get(handlers::products::get_product))
        .route(
            "/api/users/me",
            get(handlers::users::get_me).put(handlers::users::update_me),
        );

    let admin_routes = Router::new()
        .route("/api/admin/users", get(handlers::admin::list_users))
        .route(
            "/api/admin/users/{id}",
            get(handlers::admin::get_user).delete(handlers::admin::delete_user),
        )
        .route(
            "/api/admin/users/{id}/activate",
            put(handlers::admin::activate_user),
        )
        .route(
            "/api/admin/users/{id}/deactivate",
            put(handlers::admin::deactivate_user),
        )
        .route(
            "/api/admin/users/{id}/roles",
            post(handlers::admin::add_role),
        )
        .route(
            "/api/admin/users/{id}/roles/{role}",
            delete(handlers::admin::remove_role),
        );

    let cors = cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        .merge(auth_routes)
        .merge(cart_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .merge(SwaggerUi::new("/api/docs").url("/api-doc/openapi.json", docs::ApiDoc::openapi()))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::authorize,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(60 * 60))
}
