//! Credential verification, registration and session token issuance.

use std::sync::Arc;

use crate::error::AppError;
use crate::models::user::{AuthResponse, RegisterRequest, User, UserRole};
use crate::repositories::user_repository::CredentialStore;
use crate::utils::jwt::{TokenKind, TokenService};
use crate::utils::password::{dummy_hash, hash_password, password_matches};
use crate::validation::Validate;

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const INVALID_REFRESH: &str = "Invalid or expired refresh token";

/// Checks a plaintext password against a PHC hash string.
pub type PasswordCheck = fn(&str, &str) -> bool;

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    tokens: TokenService,
    verify_password: PasswordCheck,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, tokens: TokenService) -> Self {
        Self::with_password_check(store, tokens, password_matches)
    }

    pub fn with_password_check(
        store: Arc<dyn CredentialStore>,
        tokens: TokenService,
        verify_password: PasswordCheck,
    ) -> Self {
        Self {
            store,
            tokens,
            verify_password,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Verifies the credentials and opens a session.
    ///
    /// Unknown email, deactivated account and wrong password all produce the
    /// same error and cost exactly one hash verification.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let candidate = self.store.find_by_email(email).await?;
        let verified = match candidate {
            Some(user) => {
                let matches = (self.verify_password)(password, &user.password_hash);
                (matches && user.is_active).then_some(user)
            }
            None => {
                (self.verify_password)(password, dummy_hash());
                None
            }
        };
        if verified.is_none() {
            tracing::warn!(email = %email, "Rejected login attempt");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let user = self
            .store
            .find_active_by_email(email)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

        let response = self.issue_session(&user)?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok(response)
    }

    /// Creates an active account together with its empty cart.
    ///
    /// An empty `roles` list yields the base role.
    pub async fn register(
        &self,
        payload: RegisterRequest,
        roles: Vec<UserRole>,
    ) -> Result<User, AppError> {
        payload.validate()?;

        if self.store.email_taken(&payload.email, None).await? {
            return Err(AppError::BadRequest("Email already in use".to_string()));
        }
        if self.store.cpf_taken(&payload.cpf, None).await? {
            return Err(AppError::BadRequest("CPF already in use".to_string()));
        }

        let password_hash = hash_password(&payload.password)?;
        let user = User::new(
            payload.email,
            payload.cpf,
            payload.full_name,
            payload.phone,
            password_hash,
            roles,
        );

        let created = self.store.create_with_cart(&user).await?;
        tracing::info!(user_id = %created.id, "User registered");
        Ok(created)
    }

    /// Exchanges a refresh token for a new access token and a rotated refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AppError> {
        let claims = self.tokens.decode(refresh_token).map_err(|err| {
            tracing::warn!(error = %err, "Refresh token rejected");
            AppError::Unauthorized(INVALID_REFRESH.to_string())
        })?;
        if claims.kind != TokenKind::Refresh {
            tracing::warn!(subject = %claims.sub, "Access token presented for refresh");
            return Err(AppError::Unauthorized(INVALID_REFRESH.to_string()));
        }

        let user = self
            .store
            .find_active_by_email(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_REFRESH.to_string()))?;

        self.issue_session(&user)
    }

    fn issue_session(&self, user: &User) -> Result<AuthResponse, AppError> {
        let token = self
            .tokens
            .issue(&user.email, &user.roles, TokenKind::Access)
            .map_err(|e| AppError::InternalServerError(e.into()))?;
        let refresh_token = self
            .tokens
            .issue(&user.email, &user.roles, TokenKind::Refresh)
            .map_err(|e| AppError::InternalServerError(e.into()))?;
        let expires_in = self.tokens.time_until_expiry(&token).num_milliseconds();

        Ok(AuthResponse {
            token,
            token_type: "Bearer".to_string(),
            refresh_token,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            roles: user.role_names(),
            expires_in,
        })
    }
}
