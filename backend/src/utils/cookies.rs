//! `Set-Cookie` construction and `Cookie` header parsing for the access token.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::config::Config;

/// Cookie carrying the access token for browser navigation.
pub const ACCESS_COOKIE_NAME: &str = "ACCESS_TOKEN";
const ACCESS_COOKIE_PATH: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Lax,
    Strict,
}

impl FromStr for SameSite {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "lax" => Ok(SameSite::Lax),
            "strict" => Ok(SameSite::Strict),
            other => Err(format!("unsupported SameSite value: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CookieOptions {
    pub secure: bool,
    pub same_site: SameSite,
}

impl CookieOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            secure: config.cookie_secure,
            same_site: config.cookie_same_site,
        }
    }
}

pub fn access_cookie(token: &str, max_age: Duration, options: CookieOptions) -> String {
    render_cookie(token, max_age.num_seconds().max(0), options)
}

pub fn clear_access_cookie(options: CookieOptions) -> String {
    render_cookie("", 0, options)
}

fn render_cookie(value: &str, max_age_secs: i64, options: CookieOptions) -> String {
    let same_site = match options.same_site {
        SameSite::Lax => "Lax",
        SameSite::Strict => "Strict",
    };
    let mut cookie = format!(
        "{}={}; Path={}; Max-Age={}; HttpOnly; SameSite={}",
        ACCESS_COOKIE_NAME, value, ACCESS_COOKIE_PATH, max_age_secs, same_site
    );
    if options.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn extract_cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key.trim() == name).then(|| value.trim().to_string())
    })
}
