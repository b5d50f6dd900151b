use chrono::{Duration, Utc};
use marketplace_backend::{
    models::user::UserRole,
    utils::jwt::{Claims, TokenKind, TokenService},
};

const BASE64URL: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

fn service() -> TokenService {
    TokenService::new(
        "integration-token-secret",
        "marketplace-api",
        Duration::hours(1),
        Duration::days(7),
    )
}

/// Replaces the character at `index` with a different base64url character
/// that flips a high bit of the encoded sextet.
fn flip_char(segment: &str, index: usize) -> String {
    let mut bytes = segment.as_bytes().to_vec();
    let position = BASE64URL
        .iter()
        .position(|c| *c == bytes[index])
        .expect("base64url character");
    bytes[index] = BASE64URL[position ^ 16];
    String::from_utf8(bytes).unwrap()
}

#[test]
fn issued_token_round_trips_subject_and_roles() {
    let tokens = service();
    let token = tokens
        .issue("ana@example.com", &[UserRole::User, UserRole::Admin], TokenKind::Access)
        .unwrap();

    assert!(tokens.validate(&token));
    assert_eq!(tokens.extract_subject(&token).unwrap(), "ana@example.com");
    let claims = tokens.decode(&token).unwrap();
    assert_eq!(claims.roles, vec!["user".to_string(), "admin".to_string()]);
    assert!(claims.auth_time > 0);
}

#[test]
fn every_signature_character_is_checked() {
    let tokens = service();
    let token = tokens
        .issue("ana@example.com", &[UserRole::User], TokenKind::Access)
        .unwrap();
    let (signed, signature) = token.rsplit_once('.').unwrap();

    for index in 0..signature.len() {
        let tampered = format!("{}.{}", signed, flip_char(signature, index));
        assert!(!tokens.validate(&tampered), "signature index {index} accepted");
        assert!(tokens.extract_subject(&tampered).is_err());
    }
}

#[test]
fn payload_tampering_is_rejected() {
    let tokens = service();
    let token = tokens
        .issue("ana@example.com", &[UserRole::User], TokenKind::Access)
        .unwrap();
    let parts: Vec<&str> = token.split('.').collect();
    let tampered = format!("{}.{}.{}", parts[0], flip_char(parts[1], 0), parts[2]);
    assert!(!tokens.validate(&tampered));
}

#[test]
fn token_signed_with_other_secret_is_rejected() {
    let other = TokenService::new(
        "some-other-secret",
        "marketplace-api",
        Duration::hours(1),
        Duration::days(7),
    );
    let token = other
        .issue("ana@example.com", &[UserRole::User], TokenKind::Access)
        .unwrap();
    assert!(!service().validate(&token));
}

#[test]
fn expired_token_fails_validation_with_zero_remaining() {
    let tokens = service();
    let mut claims = Claims::new(
        "ana@example.com",
        &[UserRole::User],
        TokenKind::Access,
        "marketplace-api",
        Duration::hours(1),
    );
    claims.exp = Utc::now().timestamp() - 1;
    let token = tokens.sign(&claims).unwrap();

    assert!(!tokens.validate(&token));
    assert!(tokens.extract_subject(&token).is_err());
    assert_eq!(tokens.time_until_expiry(&token), Duration::zero());
}

#[test]
fn remaining_lifetime_never_exceeds_ttl() {
    let tokens = service();
    let access = tokens
        .issue("ana@example.com", &[UserRole::User], TokenKind::Access)
        .unwrap();
    let refresh = tokens
        .issue("ana@example.com", &[UserRole::User], TokenKind::Refresh)
        .unwrap();

    assert!(tokens.time_until_expiry(&access) <= Duration::hours(1));
    assert!(tokens.time_until_expiry(&refresh) > Duration::hours(1));
    assert!(tokens.time_until_expiry(&refresh) <= Duration::days(7));
}
