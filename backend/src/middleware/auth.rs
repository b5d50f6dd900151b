//! Request authorizer.
//!
//! [`authorize`] runs once in front of every route. It never rejects a request:
//! it only decides whether a [`Principal`] is attached. Handlers that need an
//! authenticated caller ask for [`Principal`] or [`AdminPrincipal`] as
//! extractors, which produce the 401/403 responses.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Query, Request, State},
    http::{header, request::Parts, HeaderMap, Method, Uri},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;

use crate::{
    error::AppError,
    models::user::User,
    repositories::user_repository::CredentialStore,
    utils::{
        cookies::{extract_cookie_value, ACCESS_COOKIE_NAME},
        jwt::{TokenKind, TokenService},
    },
};

const STATIC_PREFIXES: [&str; 5] = ["/css/", "/js/", "/images/", "/assets/", "/webjars/"];
const PUBLIC_AUTH_PATHS: [&str; 3] = ["/api/auth/login", "/api/auth/register", "/api/auth/refresh"];
const PUBLIC_PAGES: [&str; 4] = ["/", "/login", "/register", "/stores"];
const CATALOG_PREFIXES: [&str; 2] = ["/api/products", "/api/stores"];

/// Everything the authorizer needs, split from the application state so it can
/// be driven without a database.
#[derive(Clone)]
pub struct AuthState {
    pub tokens: TokenService,
    pub credentials: Arc<dyn CredentialStore>,
    /// Accept `?token=` when no header or cookie carries one.
    pub allow_query_token: bool,
}

/// Where a request ended up after the authorizer ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Public route; no token was examined.
    Bypassed,
    /// No usable token. The request continues without a principal.
    Anonymous,
    Authenticated,
}

/// The authenticated caller bound to a request.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user: User,
    /// `ROLE_`-prefixed names of the user's roles.
    pub authorities: Vec<String>,
}

impl Principal {
    pub fn new(user: User) -> Self {
        let authorities = user.authorities();
        Self { user, authorities }
    }
}

/// A [`Principal`] holding the admin role.
#[derive(Debug, Clone)]
pub struct AdminPrincipal(pub Principal);

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

impl<S> FromRequestParts<S> for AdminPrincipal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;
        if !principal.user.is_admin() {
            return Err(AppError::Forbidden("Admin role required".to_string()));
        }
        Ok(AdminPrincipal(principal))
    }
}

/// Routes reachable without authentication.
pub fn is_public_route(method: &Method, path: &str) -> bool {
    if method == Method::OPTIONS {
        return true;
    }
    if path == "/favicon.ico" || STATIC_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return true;
    }
    if PUBLIC_AUTH_PATHS.contains(&path) {
        return true;
    }
    if PUBLIC_PAGES.contains(&path) || path.starts_with("/stores/") {
        return true;
    }
    if (method == Method::GET || method == Method::HEAD)
        && CATALOG_PREFIXES
            .iter()
            .any(|prefix| path == *prefix || path.starts_with(&format!("{}/", prefix)))
    {
        return true;
    }
    path == "/api/docs" || path.starts_with("/api/docs/") || path.starts_with("/api-doc/")
}

fn parse_bearer_token(header: &str) -> Option<&str> {
    let (scheme, rest) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    (!token.is_empty()).then_some(token)
}

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Percent-decoded `token` query parameter. A query string that does not
/// parse yields nothing.
fn query_token(uri: &Uri) -> Option<String> {
    Query::<TokenQuery>::try_from_uri(uri)
        .ok()
        .and_then(|Query(query)| query.token)
        .filter(|token| !token.is_empty())
}

/// Picks the first token source present: bearer header, then access cookie,
/// then (when allowed) the query string.
pub fn extract_token(headers: &HeaderMap, uri: &Uri, allow_query: bool) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer_token)
        .map(str::to_string);
    if bearer.is_some() {
        return bearer;
    }

    let cookie = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| extract_cookie_value(raw, ACCESS_COOKIE_NAME))
        .filter(|value| !value.is_empty());
    if cookie.is_some() {
        return cookie;
    }

    if allow_query {
        return query_token(uri);
    }
    None
}

pub async fn authorize(State(state): State<AuthState>, mut request: Request, next: Next) -> Response {
    let outcome = resolve_principal(&state, &mut request).await;
    tracing::debug!(
        method = %request.method(),
        path = %request.uri().path(),
        outcome = ?outcome,
        "Request authorization resolved"
    );
    request.extensions_mut().insert(outcome);
    next.run(request).await
}

async fn resolve_principal(state: &AuthState, request: &mut Request) -> AuthOutcome {
    if is_public_route(request.method(), request.uri().path()) {
        return AuthOutcome::Bypassed;
    }

    let Some(token) = extract_token(request.headers(), request.uri(), state.allow_query_token)
    else {
        return AuthOutcome::Anonymous;
    };

    if !state.tokens.validate(&token) {
        request.extensions_mut().remove::<Principal>();
        return AuthOutcome::Anonymous;
    }

    let subject = match state.tokens.decode(&token) {
        Ok(claims) if claims.kind == TokenKind::Access => claims.sub,
        Ok(_) => {
            tracing::warn!("Refresh token presented as a request credential");
            request.extensions_mut().remove::<Principal>();
            return AuthOutcome::Anonymous;
        }
        Err(err) => {
            tracing::warn!(error = %err, "Could not read token subject");
            request.extensions_mut().remove::<Principal>();
            return AuthOutcome::Anonymous;
        }
    };

    if request.extensions().get::<Principal>().is_some() {
        return AuthOutcome::Authenticated;
    }

    match state.credentials.find_active_by_email(&subject).await {
        Ok(Some(user)) => {
            request.extensions_mut().insert(Principal::new(user));
            AuthOutcome::Authenticated
        }
        Ok(None) => {
            tracing::warn!(subject = %subject, "Token subject is unknown or inactive");
            request.extensions_mut().remove::<Principal>();
            AuthOutcome::Anonymous
        }
        Err(err) => {
            tracing::warn!(subject = %subject, error = %err, "Principal lookup failed");
            request.extensions_mut().remove::<Principal>();
            AuthOutcome::Anonymous
        }
    }
}
