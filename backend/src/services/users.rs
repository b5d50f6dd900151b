//! Account administration and self-service profile updates.

use std::sync::Arc;

use crate::error::AppError;
use crate::models::user::{RoleChange, UpdateProfileRequest, User, UserResponse, UserRole};
use crate::models::{PaginatedResponse, PaginationQuery};
use crate::repositories::user_repository::CredentialStore;
use crate::types::UserId;
use crate::utils::password::hash_password;
use crate::validation::Validate;

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn CredentialStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        query: &PaginationQuery,
    ) -> Result<PaginatedResponse<UserResponse>, AppError> {
        let limit = query.limit();
        let offset = query.offset();
        let users = self.store.list(limit, offset).await?;
        let total = self.store.count().await?;
        let data = users.into_iter().map(UserResponse::from).collect();
        Ok(PaginatedResponse::new(data, total, limit, offset))
    }

    pub async fn find(&self, id: UserId) -> Result<User, AppError> {
        self.store.find_by_id(id).await?.ok_or_else(user_not_found)
    }

    pub async fn set_active(&self, id: UserId, active: bool) -> Result<User, AppError> {
        let user = self
            .store
            .set_active(id, active)
            .await?
            .ok_or_else(user_not_found)?;
        tracing::info!(user_id = %id, active, "User active flag changed");
        Ok(user)
    }

    /// Grants `role`. Granting a role the user already holds is a no-op.
    pub async fn add_role(&self, id: UserId, role: UserRole) -> Result<User, AppError> {
        self.change_roles(id, RoleChange::Grant(role)).await
    }

    /// Revokes `role`. Every account keeps at least one role.
    pub async fn remove_role(&self, id: UserId, role: UserRole) -> Result<User, AppError> {
        self.change_roles(id, RoleChange::Revoke(role)).await
    }

    async fn change_roles(&self, id: UserId, change: RoleChange) -> Result<User, AppError> {
        let user = self
            .store
            .change_roles(id, change)
            .await?
            .ok_or_else(user_not_found)?;
        tracing::info!(
            user_id = %id,
            change = ?change,
            roles = ?user.role_names(),
            "Roles updated"
        );
        Ok(user)
    }

    /// Applies a self-service profile update for `current`.
    pub async fn update_profile(
        &self,
        current: &User,
        payload: UpdateProfileRequest,
    ) -> Result<User, AppError> {
        payload.validate()?;

        let mut user = current.clone();

        if let Some(email) = payload.email {
            if email != user.email && self.store.email_taken(&email, Some(user.id)).await? {
                return Err(AppError::BadRequest("Email already in use".to_string()));
            }
            user.email = email;
        }
        if let Some(cpf) = payload.cpf {
            if cpf != user.cpf && self.store.cpf_taken(&cpf, Some(user.id)).await? {
                return Err(AppError::BadRequest("CPF already in use".to_string()));
            }
            user.cpf = cpf;
        }
        if let Some(full_name) = payload.full_name {
            user.full_name = full_name;
        }
        if let Some(phone) = payload.phone {
            user.phone = Some(phone);
        }
        if let Some(password) = payload.password.filter(|p| !p.is_empty()) {
            user.password_hash = hash_password(&password)?;
            tracing::debug!(user_id = %user.id, "Password changed");
        }

        let updated = self.store.update_profile(&user).await?;
        tracing::info!(user_id = %updated.id, "Profile updated");
        Ok(updated)
    }

    /// Deletes the account along with its cart, stores and their products.
    pub async fn delete(&self, id: UserId) -> Result<(), AppError> {
        if !self.store.delete_cascade(id).await? {
            return Err(user_not_found());
        }
        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }
}
