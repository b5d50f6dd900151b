//! Models that represent accounts, authentication payloads, and roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::Validate;

use crate::{error::AppError, types::UserId, validation::rules};

/// Closed set of roles an account can hold.
///
/// The canonical form is the lowercase name (`"user"`, `"admin"`). Legacy
/// spellings such as `"ROLE_ADMIN"` or `"ADMIN"` are accepted by [`UserRole::parse`]
/// and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ToSchema, Default)]
pub enum UserRole {
    /// Base role held by every registered account.
    #[default]
    User,
    /// Marketplace administrator.
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }

    /// Prefixed authority name used when exposing roles to clients.
    pub fn authority(&self) -> &'static str {
        match self {
            UserRole::User => "ROLE_USER",
            UserRole::Admin => "ROLE_ADMIN",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let name = match trimmed.get(..5) {
            Some(prefix) if prefix.eq_ignore_ascii_case("role_") => &trimmed[5..],
            _ => trimmed,
        };
        if name.eq_ignore_ascii_case("user") {
            Some(UserRole::User)
        } else if name.eq_ignore_ascii_case("admin") {
            Some(UserRole::Admin)
        } else {
            None
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserRole::parse(s).ok_or_else(|| format!("unknown role: {}", s))
    }
}

impl Serialize for UserRole {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        UserRole::parse(&s)
            .ok_or_else(|| serde::de::Error::unknown_variant(&s, &["user", "admin"]))
    }
}

/// A single grant or revocation applied to an account's roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChange {
    Grant(UserRole),
    Revoke(UserRole),
}

impl RoleChange {
    /// Role list after the change, or `None` when nothing changes.
    pub fn apply(self, roles: &[UserRole]) -> Result<Option<Vec<UserRole>>, AppError> {
        match self {
            RoleChange::Grant(role) if roles.contains(&role) => Ok(None),
            RoleChange::Grant(role) => {
                let mut granted = roles.to_vec();
                granted.push(role);
                Ok(Some(granted))
            }
            RoleChange::Revoke(role) if !roles.contains(&role) => Ok(None),
            RoleChange::Revoke(role) => {
                let kept: Vec<UserRole> = roles.iter().copied().filter(|r| *r != role).collect();
                if kept.is_empty() {
                    return Err(AppError::BadRequest(
                        "User must keep at least one role".to_string(),
                    ));
                }
                Ok(Some(kept))
            }
        }
    }
}

/// An account as loaded from the credential store.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    /// Unique login identifier.
    pub email: String,
    /// Unique national taxpayer number (11 digits).
    pub cpf: String,
    pub full_name: String,
    pub phone: Option<String>,
    /// Argon2 PHC string; plaintext passwords are never stored.
    pub password_hash: String,
    /// Ordered, never empty.
    pub roles: Vec<UserRole>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw `users` row; roles are stored as a `TEXT[]`.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: UserId,
    pub email: String,
    pub cpf: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub roles: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let mut roles = Vec::with_capacity(row.roles.len());
        for raw in &row.roles {
            match UserRole::parse(raw) {
                Some(role) if !roles.contains(&role) => roles.push(role),
                Some(_) => {}
                None => tracing::warn!(user_id = %row.id, role = %raw, "Ignoring unknown role"),
            }
        }
        if roles.is_empty() {
            roles.push(UserRole::User);
        }

        User {
            id: row.id,
            email: row.email,
            cpf: row.cpf,
            full_name: row.full_name,
            phone: row.phone,
            password_hash: row.password_hash,
            roles,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl User {
    /// Builds a fresh active account. An empty role list becomes `[User]`.
    pub fn new(
        email: String,
        cpf: String,
        full_name: String,
        phone: Option<String>,
        password_hash: String,
        roles: Vec<UserRole>,
    ) -> Self {
        let now = Utc::now();
        let roles = if roles.is_empty() {
            vec![UserRole::User]
        } else {
            roles
        };
        Self {
            id: UserId::new(),
            email,
            cpf,
            full_name,
            phone,
            password_hash,
            roles,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_role(&self, role: UserRole) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(UserRole::Admin)
    }

    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.as_str().to_string()).collect()
    }

    pub fn authorities(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.authority().to_string()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
/// Self-service registration payload.
pub struct RegisterRequest {
    #[validate(
        length(min = 3, max = 100),
        custom(function = "rules::validate_not_blank")
    )]
    pub full_name: String,
    #[validate(email, length(max = 100))]
    pub email: String,
    #[validate(custom(function = "rules::validate_cpf"))]
    pub cpf: String,
    #[validate(length(min = 6, max = 100))]
    pub password: String,
    #[serde(default)]
    #[validate(custom(function = "rules::validate_phone"))]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
/// Credentials submitted by a user attempting to authenticate.
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Result of a successful login or token refresh.
pub struct AuthResponse {
    pub token: String,
    /// Always `"Bearer"`.
    pub token_type: String,
    pub refresh_token: String,
    pub email: String,
    pub full_name: String,
    pub roles: Vec<String>,
    /// Remaining access-token lifetime in milliseconds at issuance.
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
/// Self-service profile update. Absent fields keep their current value.
pub struct UpdateProfileRequest {
    #[validate(
        length(min = 3, max = 100),
        custom(function = "rules::validate_not_blank")
    )]
    pub full_name: Option<String>,
    #[validate(email, length(max = 100))]
    pub email: Option<String>,
    #[validate(custom(function = "rules::validate_cpf"))]
    pub cpf: Option<String>,
    #[validate(custom(function = "rules::validate_phone"))]
    pub phone: Option<String>,
    #[validate(length(min = 6, max = 100))]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoleRequest {
    pub role: UserRole,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Public-facing representation of an account.
pub struct UserResponse {
    #[schema(value_type = String)]
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    pub cpf: String,
    pub phone: Option<String>,
    pub roles: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let roles = user.role_names();
        UserResponse {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            cpf: user.cpf,
            phone: user.phone,
            roles,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            full_name: "Ana Souza".into(),
            email: "a@b.com".into(),
            cpf: "12345678901".into(),
            password: "secret1".into(),
            phone: None,
        }
    }

    #[test]
    fn role_parse_normalizes_legacy_spellings() {
        for raw in ["admin", "ADMIN", "ROLE_ADMIN", "role_admin", " Admin "] {
            assert_eq!(UserRole::parse(raw), Some(UserRole::Admin), "{raw}");
        }
        for raw in ["user", "USER", "ROLE_USER"] {
            assert_eq!(UserRole::parse(raw), Some(UserRole::User), "{raw}");
        }
        assert_eq!(UserRole::parse("ROLE_"), None);
        assert_eq!(UserRole::parse("seller"), None);
    }

    #[test]
    fn role_serde_emits_canonical_form() {
        let a: UserRole = serde_json::from_str("\"ROLE_ADMIN\"").unwrap();
        assert_eq!(a, UserRole::Admin);
        assert_eq!(
            serde_json::to_value(UserRole::Admin).unwrap(),
            Value::String("admin".into())
        );
        assert!(serde_json::from_str::<UserRole>("\"root\"").is_err());
    }

    #[test]
    fn new_user_defaults_to_base_role_and_active() {
        let user = User::new(
            "a@b.com".into(),
            "12345678901".into(),
            "Ana".into(),
            None,
            "hash".into(),
            Vec::new(),
        );
        assert_eq!(user.roles, vec![UserRole::User]);
        assert!(user.is_active);
        assert!(!user.is_admin());
        assert_eq!(user.authorities(), vec!["ROLE_USER".to_string()]);
    }

    #[test]
    fn row_conversion_dedupes_and_drops_unknown_roles() {
        let now = Utc::now();
        let row = UserRow {
            id: UserId::new(),
            email: "a@b.com".into(),
            cpf: "12345678901".into(),
            full_name: "Ana".into(),
            phone: None,
            password_hash: "hash".into(),
            roles: vec!["ROLE_USER".into(), "user".into(), "ghost".into(), "ADMIN".into()],
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let user = User::from(row);
        assert_eq!(user.roles, vec![UserRole::User, UserRole::Admin]);
    }

    #[test]
    fn register_request_validation() {
        assert!(register_request().validate().is_ok());

        let mut bad = register_request();
        bad.cpf = "123".into();
        bad.password = "12345".into();
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("cpf"));
        assert!(fields.contains_key("password"));

        let mut bad_phone = register_request();
        bad_phone.phone = Some("12".into());
        assert!(bad_phone.validate().is_err());
    }

    #[test]
    fn role_change_grants_once_and_keeps_order() {
        let granted = RoleChange::Grant(UserRole::Admin)
            .apply(&[UserRole::User])
            .unwrap();
        assert_eq!(granted, Some(vec![UserRole::User, UserRole::Admin]));
        assert_eq!(
            RoleChange::Grant(UserRole::Admin)
                .apply(&[UserRole::User, UserRole::Admin])
                .unwrap(),
            None
        );
    }

    #[test]
    fn role_change_never_revokes_the_last_role() {
        let kept = RoleChange::Revoke(UserRole::Admin)
            .apply(&[UserRole::User, UserRole::Admin])
            .unwrap();
        assert_eq!(kept, Some(vec![UserRole::User]));
        assert_eq!(
            RoleChange::Revoke(UserRole::Admin)
                .apply(&[UserRole::User])
                .unwrap(),
            None
        );
        let err = RoleChange::Revoke(UserRole::User)
            .apply(&[UserRole::User])
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "User must keep at least one role"));
    }

    #[test]
    fn profile_update_rejects_blank_name() {
        let payload = UpdateProfileRequest {
            full_name: Some("     ".into()),
            email: None,
            cpf: None,
            phone: None,
            password: None,
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("full_name"));

        let payload = UpdateProfileRequest {
            full_name: Some("Ana Lima".into()),
            email: None,
            cpf: None,
            phone: None,
            password: None,
        };
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn user_response_hides_password_hash() {
        let user = User::new(
            "a@b.com".into(),
            "12345678901".into(),
            "Ana".into(),
            None,
            "$argon2id$secret".into(),
            vec![UserRole::Admin],
        );
        let json = serde_json::to_string(&UserResponse::from(user)).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"admin\""));
    }
}
