use std::sync::Mutex;

use async_trait::async_trait;
use marketplace_backend::{
    error::AppError,
    models::user::{RoleChange, User},
    repositories::user_repository::CredentialStore,
    types::UserId,
};

/// Credential store kept in a vector, for router tests that have no database.
#[derive(Default)]
pub struct MemoryCredentialStore {
    users: Mutex<Vec<User>>,
}

impl MemoryCredentialStore {
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users),
        }
    }

    fn find(&self, predicate: impl Fn(&User) -> bool) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| predicate(u)).cloned()
    }

    fn modify(&self, id: UserId, change: impl FnOnce(&mut User)) -> Option<User> {
        let mut users = self.users.lock().unwrap();
        let user = users.iter_mut().find(|u| u.id == id)?;
        change(user);
        Some(user.clone())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.find(|u| u.email == email))
    }

    async fn find_active_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.find(|u| u.email == email && u.is_active))
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AppError> {
        Ok(self.find(|u| u.id == id))
    }

    async fn email_taken(&self, email: &str, except: Option<UserId>) -> Result<bool, AppError> {
        Ok(self.find(|u| u.email == email && Some(u.id) != except).is_some())
    }

    async fn cpf_taken(&self, cpf: &str, except: Option<UserId>) -> Result<bool, AppError> {
        Ok(self.find(|u| u.cpf == cpf && Some(u.id) != except).is_some())
    }

    async fn create_with_cart(&self, user: &User) -> Result<User, AppError> {
        self.users.lock().unwrap().push(user.clone());
        Ok(user.clone())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.users.lock().unwrap().len() as i64)
    }

    async fn set_active(&self, id: UserId, active: bool) -> Result<Option<User>, AppError> {
        Ok(self.modify(id, |u| u.is_active = active))
    }

    async fn change_roles(&self, id: UserId, change: RoleChange) -> Result<Option<User>, AppError> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(roles) = change.apply(&user.roles)? {
            user.roles = roles;
        }
        Ok(Some(user.clone()))
    }

    async fn update_profile(&self, user: &User) -> Result<User, AppError> {
        let updated = user.clone();
        self.modify(user.id, |u| *u = updated)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn delete_cascade(&self, id: UserId) -> Result<bool, AppError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() != before)
    }
}
