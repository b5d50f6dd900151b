//! Issuing and verifying signed session tokens.
//!
//! Tokens are HS256 JWS compact strings. Every call to [`TokenService::validate`],
//! [`TokenService::extract_subject`] or [`TokenService::time_until_expiry`]
//! re-parses the token and re-verifies its signature; nothing is cached.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{config::Config, models::user::UserRole};

/// HMAC keys shorter than this are padded before use.
pub const MIN_KEY_BYTES: usize = 32;
const KEY_FILLER: u8 = b'0';
const BEARER: &str = "Bearer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // login email
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Milliseconds since the epoch at which the session was authenticated.
    pub auth_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl Claims {
    pub fn new(
        subject: &str,
        roles: &[UserRole],
        kind: TokenKind,
        issuer: &str,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        let exp = now + ttl;

        Self {
            sub: subject.to_string(),
            iss: issuer.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            roles: roles.iter().map(|role| role.as_str().to_string()).collect(),
            kind,
            auth_time: now.timestamp_millis(),
            token_type: matches!(kind, TokenKind::Access).then(|| BEARER.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token is not a three-segment JWS")]
    Malformed,
    #[error("token rejected: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

/// Pads `secret` with a filler byte until it reaches [`MIN_KEY_BYTES`].
pub fn signing_key_bytes(secret: &str) -> Vec<u8> {
    let mut key = secret.as_bytes().to_vec();
    if key.len() < MIN_KEY_BYTES {
        key.resize(MIN_KEY_BYTES, KEY_FILLER);
    }
    key
}

impl TokenService {
    pub fn new(secret: &str, issuer: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let key = signing_key_bytes(secret);
        Self {
            encoding_key: EncodingKey::from_secret(&key),
            decoding_key: DecodingKey::from_secret(&key),
            issuer: issuer.to_string(),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_secret,
            &config.jwt_issuer,
            Duration::milliseconds(config.jwt_expiration_ms),
            Duration::milliseconds(config.jwt_refresh_expiration_ms),
        )
    }

    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    pub fn issue(
        &self,
        subject: &str,
        roles: &[UserRole],
        kind: TokenKind,
    ) -> Result<String, TokenError> {
        let claims = Claims::new(subject, roles, kind, &self.issuer, self.ttl(kind));
        self.sign(&claims)
    }

    /// Signs pre-built claims with the service key.
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        Ok(encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.encoding_key,
        )?)
    }

    /// Parses and verifies `token`, returning its claims.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        if token.is_empty() || token.split('.').count() != 3 {
            return Err(TokenError::Malformed);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }

    pub fn validate(&self, token: &str) -> bool {
        match self.decode(token) {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(error = %err, "Token validation failed");
                false
            }
        }
    }

    pub fn extract_subject(&self, token: &str) -> Result<String, TokenError> {
        self.decode(token).map(|claims| claims.sub)
    }

    /// Remaining lifetime of `token`; zero when expired or unreadable.
    pub fn time_until_expiry(&self, token: &str) -> Duration {
        match self.decode(token) {
            Ok(claims) => {
                let remaining = claims.exp * 1000 - Utc::now().timestamp_millis();
                Duration::milliseconds(remaining.max(0))
            }
            Err(_) => Duration::zero(),
        }
    }
}
