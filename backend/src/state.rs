use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{
    config::Config,
    middleware::auth::AuthState,
    repositories::{user_repository::CredentialStore, PgCredentialStore},
    services::{AuthService, CartService, UserService},
    utils::{cookies::CookieOptions, jwt::TokenService},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub tokens: TokenService,
    pub credentials: Arc<dyn CredentialStore>,
    pub auth: AuthService,
    pub carts: CartService,
    pub users: UserService,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        let credentials: Arc<dyn CredentialStore> = Arc::new(PgCredentialStore::new(pool.clone()));
        Self::with_credentials(pool, config, credentials)
    }

    /// Builds the state around an arbitrary credential store.
    pub fn with_credentials(
        pool: PgPool,
        config: Config,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        let tokens = TokenService::from_config(&config);
        Self {
            auth: AuthService::new(credentials.clone(), tokens.clone()),
            carts: CartService::new(pool.clone()),
            users: UserService::new(credentials.clone()),
            pool,
            config,
            tokens,
            credentials,
        }
    }

    pub fn cookie_options(&self) -> CookieOptions {
        CookieOptions::from_config(&self.config)
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        AuthState {
            tokens: state.tokens.clone(),
            credentials: state.credentials.clone(),
            allow_query_token: state.config.allow_query_token,
        }
    }
}
