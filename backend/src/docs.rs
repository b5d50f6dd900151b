#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use crate::{
    handlers::auth::TokenStatus,
    models::{
        cart::{AddCartItemRequest, CartCountResponse, CartLineResponse, CartResponse},
        product::Product,
        user::{
            AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, RoleRequest,
            UpdateProfileRequest, UserResponse, UserRole,
        },
        PaginatedResponse,
    },
};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        login_doc,
        register_doc,
        refresh_doc,
        logout_doc,
        me_doc,
        validate_token_doc,
        get_cart_doc,
        cart_count_doc,
        add_cart_item_doc,
        update_cart_item_doc,
        remove_cart_item_doc,
        clear_cart_doc,
        checkout_doc,
        get_product_doc,
        get_profile_doc,
        update_profile_doc,
        admin_list_users_doc,
        admin_get_user_doc,
        admin_activate_user_doc,
        admin_deactivate_user_doc,
        admin_add_role_doc,
        admin_remove_role_doc,
        admin_delete_user_doc
    ),
    components(
        schemas(
            // auth
            LoginRequest,
            RegisterRequest,
            RefreshRequest,
            AuthResponse,
            TokenStatus,
            // users
            UserResponse,
            UpdateProfileRequest,
            RoleRequest,
            UserRole,
            // catalog & cart
            Product,
            AddCartItemRequest,
            CartLineResponse,
            CartResponse,
            CartCountResponse
        )
    ),
    modifiers(&SecuritySchemes),
    tags(
        (name = "Auth", description = "Login, registration and session tokens"),
        (name = "Cart", description = "Shopping cart and checkout"),
        (name = "Catalog", description = "Public product reads"),
        (name = "Users", description = "Self-service profile"),
        (name = "Admin", description = "User administration")
    ),
    security(("BearerAuth" = []))
)]
pub struct ApiDoc;

struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();

        let mut bearer = Http::new(HttpAuthScheme::Bearer);
        bearer.bearer_format = Some("JWT".to_string());

        components.add_security_scheme("BearerAuth", SecurityScheme::Http(bearer));
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session opened; also sets the ACCESS_TOKEN cookie", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth",
    security(())
)]
fn login_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created with an empty cart", body = UserResponse),
        (status = 400, description = "Invalid payload or email/CPF already in use")
    ),
    tag = "Auth",
    security(())
)]
fn register_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token and rotated refresh token", body = AuthResponse),
        (status = 401, description = "Invalid or expired refresh token")
    ),
    tag = "Auth",
    security(())
)]
fn refresh_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Access cookie cleared", body = serde_json::Value)),
    tag = "Auth"
)]
fn logout_doc() {}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Authenticated user", body = UserResponse),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Auth"
)]
fn me_doc() {}

#[utoipa::path(
    get,
    path = "/api/auth/validate-token",
    responses((status = 200, description = "Whether the request carried a valid session", body = TokenStatus)),
    tag = "Auth"
)]
fn validate_token_doc() {}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses((status = 200, body = CartResponse)),
    tag = "Cart"
)]
fn get_cart_doc() {}

#[utoipa::path(
    get,
    path = "/api/cart/count",
    responses((status = 200, body = CartCountResponse)),
    tag = "Cart"
)]
fn cart_count_doc() {}

#[utoipa::path(
    post,
    path = "/api/cart/items",
    request_body = AddCartItemRequest,
    responses(
        (status = 200, body = CartResponse),
        (status = 400, description = "Bad quantity or insufficient stock"),
        (status = 404, description = "Product not found or unavailable")
    ),
    tag = "Cart"
)]
fn add_cart_item_doc() {}

#[utoipa::path(
    put,
    path = "/api/cart/items/{id}",
    params(
        ("id" = String, Path, description = "Cart line id"),
        ("quantity" = i32, Query, description = "New quantity; zero or less removes the line")
    ),
    responses(
        (status = 200, body = CartResponse),
        (status = 400, description = "Insufficient stock or line belongs to another cart"),
        (status = 404, description = "Cart line not found")
    ),
    tag = "Cart"
)]
fn update_cart_item_doc() {}

#[utoipa::path(
    delete,
    path = "/api/cart/items/{id}",
    params(("id" = String, Path, description = "Cart line id")),
    responses(
        (status = 200, body = CartResponse),
        (status = 400, description = "Line belongs to another cart"),
        (status = 404, description = "Cart line not found")
    ),
    tag = "Cart"
)]
fn remove_cart_item_doc() {}

#[utoipa::path(
    post,
    path = "/api/cart/clear",
    responses((status = 200, body = CartResponse)),
    tag = "Cart"
)]
fn clear_cart_doc() {}

#[utoipa::path(
    post,
    path = "/api/cart/checkout",
    responses(
        (status = 200, description = "Stock decremented and cart emptied", body = CartResponse),
        (status = 400, description = "Cart is empty or a product lacks stock")
    ),
    tag = "Cart"
)]
fn checkout_doc() {}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, body = Product),
        (status = 404, description = "Product not found or unavailable")
    ),
    tag = "Catalog",
    security(())
)]
fn get_product_doc() {}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses((status = 200, body = UserResponse)),
    tag = "Users"
)]
fn get_profile_doc() {}

#[utoipa::path(
    put,
    path = "/api/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, body = UserResponse),
        (status = 400, description = "Invalid payload or email/CPF already in use")
    ),
    tag = "Users"
)]
fn update_profile_doc() {}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(
        ("limit" = Option<i64>, Query, description = "Page size (1..=500, default 50)"),
        ("offset" = Option<i64>, Query, description = "Records to skip")
    ),
    responses(
        (status = 200, body = PaginatedResponse<UserResponse>),
        (status = 403, description = "Admin role required")
    ),
    tag = "Admin"
)]
fn admin_list_users_doc() {}

#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses((status = 200, body = UserResponse), (status = 404, description = "User not found")),
    tag = "Admin"
)]
fn admin_get_user_doc() {}

#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/activate",
    params(("id" = String, Path, description = "User id")),
    responses((status = 200, body = UserResponse), (status = 404, description = "User not found")),
    tag = "Admin"
)]
fn admin_activate_user_doc() {}

#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/deactivate",
    params(("id" = String, Path, description = "User id")),
    responses((status = 200, body = UserResponse), (status = 404, description = "User not found")),
    tag = "Admin"
)]
fn admin_deactivate_user_doc() {}

#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/roles",
    params(("id" = String, Path, description = "User id")),
    request_body = RoleRequest,
    responses((status = 200, body = UserResponse), (status = 404, description = "User not found")),
    tag = "Admin"
)]
fn admin_add_role_doc() {}

#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}/roles/{role}",
    params(
        ("id" = String, Path, description = "User id"),
        ("role" = String, Path, description = "Role name, e.g. admin or ROLE_ADMIN")
    ),
    responses(
        (status = 200, body = UserResponse),
        (status = 400, description = "Unknown role or last remaining role"),
        (status = 404, description = "User not found")
    ),
    tag = "Admin"
)]
fn admin_remove_role_doc() {}

#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 204, description = "User and owned data deleted"),
        (status = 404, description = "User not found")
    ),
    tag = "Admin"
)]
fn admin_delete_user_doc() {}
