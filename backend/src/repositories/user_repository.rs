//! Credential store trait, the seam between authentication and persistence.
//!
//! The trait is mocked with mockall in the authenticator, authorizer and user
//! administration tests.

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::user::{RoleChange, User};
use crate::types::UserId;

/// Lookups and writes over registered identities.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Finds an identity by login email regardless of its active flag.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Finds an identity by login email, ignoring deactivated accounts.
    async fn find_active_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AppError>;

    /// Whether `email` belongs to an identity other than `except`.
    async fn email_taken(&self, email: &str, except: Option<UserId>) -> Result<bool, AppError>;

    /// Whether `cpf` belongs to an identity other than `except`.
    async fn cpf_taken(&self, cpf: &str, except: Option<UserId>) -> Result<bool, AppError>;

    /// Inserts the identity and its empty cart in one transaction.
    async fn create_with_cart(&self, user: &User) -> Result<User, AppError>;

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, AppError>;

    async fn count(&self) -> Result<i64, AppError>;

    async fn set_active(&self, id: UserId, active: bool) -> Result<Option<User>, AppError>;

    /// Applies `change` while holding the identity's row, so concurrent edits
    /// cannot interleave. `None` when the identity does not exist.
    async fn change_roles(&self, id: UserId, change: RoleChange) -> Result<Option<User>, AppError>;

    /// Persists email, cpf, name, phone and password hash of `user`.
    async fn update_profile(&self, user: &User) -> Result<User, AppError>;

    /// Deletes the identity and everything it owns. Returns `false` when the
    /// identity does not exist.
    async fn delete_cascade(&self, id: UserId) -> Result<bool, AppError>;
}
