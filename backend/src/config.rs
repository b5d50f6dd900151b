use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::utils::cookies::SameSite;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Access token lifetime in milliseconds.
    pub jwt_expiration_ms: i64,
    /// Refresh token lifetime in milliseconds.
    pub jwt_refresh_expiration_ms: i64,
    pub jwt_issuer: String,
    /// Accept `?token=` as a last-resort token source. Meant for manual testing only.
    pub allow_query_token: bool,
    pub cookie_secure: bool,
    pub cookie_same_site: SameSite,
    pub server_port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/marketplace".to_string(),
            jwt_secret: "mySecretKeyForJWTGenerationInMarketplaceApplication2024".to_string(),
            jwt_expiration_ms: 86_400_000,
            jwt_refresh_expiration_ms: 604_800_000,
            jwt_issuer: "marketplace-api".to_string(),
            allow_query_token: true,
            cookie_secure: false,
            cookie_same_site: SameSite::Lax,
            server_port: 8080,
            cors_allowed_origins: vec![
                "http://localhost:8080".to_string(),
                "http://localhost:3000".to_string(),
            ],
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        let database_url = env::var("DATABASE_URL").unwrap_or(defaults.database_url);
        let jwt_secret = env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret);
        let jwt_issuer = env::var("JWT_ISSUER").unwrap_or(defaults.jwt_issuer);

        let jwt_expiration_ms = parse_var("JWT_EXPIRATION_MS", defaults.jwt_expiration_ms)?;
        let jwt_refresh_expiration_ms = parse_var(
            "JWT_REFRESH_EXPIRATION_MS",
            defaults.jwt_refresh_expiration_ms,
        )?;
        if jwt_expiration_ms <= 0 || jwt_refresh_expiration_ms <= 0 {
            return Err(anyhow!("Token lifetimes must be positive"));
        }

        let allow_query_token = parse_var("ALLOW_QUERY_TOKEN", defaults.allow_query_token)?;
        let cookie_secure = parse_var("COOKIE_SECURE", defaults.cookie_secure)?;
        let cookie_same_site = parse_var("COOKIE_SAME_SITE", defaults.cookie_same_site)?;
        let server_port = parse_var("SERVER_PORT", defaults.server_port)?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or(defaults.cors_allowed_origins);

        Ok(Config {
            database_url,
            jwt_secret,
            jwt_expiration_ms,
            jwt_refresh_expiration_ms,
            jwt_issuer,
            allow_query_token,
            cookie_secure,
            cookie_same_site,
            server_port,
            cors_allowed_origins,
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> anyhow::Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow!("Invalid {} value: {}", name, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.jwt_expiration_ms, 86_400_000);
        assert_eq!(config.jwt_refresh_expiration_ms, 604_800_000);
        assert_eq!(config.jwt_issuer, "marketplace-api");
        assert!(config.allow_query_token);
        assert_eq!(config.cookie_same_site, SameSite::Lax);
    }

    #[test]
    fn parse_var_falls_back_when_unset() {
        let value: u16 = parse_var("MARKETPLACE_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }
}
