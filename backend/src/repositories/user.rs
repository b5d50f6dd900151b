//! PostgreSQL-backed [`CredentialStore`].

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{is_unique_violation, AppError};
use crate::models::user::{RoleChange, User, UserRole, UserRow};
use crate::repositories::transaction::{begin_transaction, commit_transaction};
use crate::repositories::user_repository::CredentialStore;
use crate::types::{CartId, UserId};

const USER_COLUMNS: &str = "id, email, cpf, full_name, phone, password_hash, roles, is_active, \
     created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_by_email(&self, predicate: &str, email: &str) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {} FROM users WHERE {}", USER_COLUMNS, predicate);
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }
}

fn role_strings(roles: &[UserRole]) -> Vec<String> {
    roles.iter().map(|r| r.as_str().to_string()).collect()
}

/// Maps a unique-constraint violation on `users` to the matching client message.
fn duplicate_user_error(err: &sqlx::Error) -> Option<AppError> {
    if !is_unique_violation(err) {
        return None;
    }
    let constraint = match err {
        sqlx::Error::Database(db) => db.constraint().unwrap_or_default().to_string(),
        _ => String::new(),
    };
    let message = if constraint.contains("cpf") {
        "CPF already in use"
    } else {
        "Email already in use"
    };
    Some(AppError::BadRequest(message.to_string()))
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.fetch_by_email("email = $1", email).await
    }

    async fn find_active_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.fetch_by_email("email = $1 AND is_active = TRUE", email)
            .await
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn email_taken(&self, email: &str, except: Option<UserId>) -> Result<bool, AppError> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn cpf_taken(&self, cpf: &str, except: Option<UserId>) -> Result<bool, AppError> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE cpf = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(cpf)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn create_with_cart(&self, user: &User) -> Result<User, AppError> {
        let mut tx = begin_transaction(&self.pool).await?;

        let query = format!(
            "INSERT INTO users (id, email, cpf, full_name, phone, password_hash, roles, is_active, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.cpf)
            .bind(&user.full_name)
            .bind(&user.phone)
            .bind(&user.password_hash)
            .bind(role_strings(&user.roles))
            .bind(user.is_active)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|err| duplicate_user_error(&err).unwrap_or_else(|| err.into()))?;

        sqlx::query("INSERT INTO carts (id, user_id) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING")
            .bind(CartId::new())
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        commit_transaction(tx).await?;
        Ok(User::from(row))
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, AppError> {
        let query = format!(
            "SELECT {} FROM users ORDER BY created_at, email LIMIT $1 OFFSET $2",
            USER_COLUMNS
        );
        let rows = sqlx::query_as::<_, UserRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn count(&self) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn set_active(&self, id: UserId, active: bool) -> Result<Option<User>, AppError> {
        let query = format!(
            "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .bind(active)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn change_roles(&self, id: UserId, change: RoleChange) -> Result<Option<User>, AppError> {
        let mut tx = begin_transaction(&self.pool).await?;

        let query = format!("SELECT {} FROM users WHERE id = $1 FOR UPDATE", USER_COLUMNS);
        let Some(row) = sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };
        let current = User::from(row);
        let Some(roles) = change.apply(&current.roles)? else {
            return Ok(Some(current));
        };

        let query = format!(
            "UPDATE users SET roles = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .bind(role_strings(&roles))
            .fetch_one(&mut *tx)
            .await?;

        commit_transaction(tx).await?;
        Ok(Some(User::from(row)))
    }

    async fn update_profile(&self, user: &User) -> Result<User, AppError> {
        let query = format!(
            "UPDATE users SET email = $2, cpf = $3, full_name = $4, phone = $5, password_hash = $6, \
             updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.cpf)
            .bind(&user.full_name)
            .bind(&user.phone)
            .bind(&user.password_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| duplicate_user_error(&err).unwrap_or_else(|| err.into()))?;
        row.map(User::from)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn delete_cascade(&self, id: UserId) -> Result<bool, AppError> {
        let mut tx = begin_transaction(&self.pool).await?;

        // Owned cart first, then lines in other carts that reference this
        // user's products, then the catalog itself.
        sqlx::query(
            "DELETE FROM cart_lines WHERE cart_id IN (SELECT id FROM carts WHERE user_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM carts WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "DELETE FROM cart_lines WHERE product_id IN ( \
                 SELECT p.id FROM products p JOIN stores s ON s.id = p.store_id \
                 WHERE s.owner_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "DELETE FROM products WHERE store_id IN (SELECT id FROM stores WHERE owner_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM stores WHERE owner_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        commit_transaction(tx).await?;
        Ok(deleted == 1)
    }
}
