//! Argon2 credential hashing.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use std::sync::OnceLock;

static DUMMY_HASH: OnceLock<String> = OnceLock::new();

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

    Ok(password_hash.to_string())
}

/// Checks `password` against a stored PHC hash string.
///
/// A stored hash that cannot be parsed counts as a mismatch so a corrupt row
/// can never authenticate.
pub fn password_matches(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is unreadable");
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Hash of a throwaway secret with the same parameters as real hashes.
///
/// Verifying against it costs as much as verifying a stored credential; it is
/// used when a login names no usable account.
pub fn dummy_hash() -> &'static str {
    DUMMY_HASH.get_or_init(|| {
        hash_password("marketplace-unused-credential").unwrap_or_else(|e| {
            tracing::error!(error = %e, "Could not prepare dummy password hash");
            String::new()
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("secret1").expect("hash should succeed");
        assert!(password_matches("secret1", &hash));
        assert!(!password_matches("secret2", &hash));
    }

    #[test]
    fn hash_never_contains_plaintext() {
        let hash = hash_password("plain-text-password").unwrap();
        assert!(!hash.contains("plain-text-password"));
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn unreadable_hash_never_matches() {
        assert!(!password_matches("secret1", "not-a-phc-string"));
        assert!(!password_matches("", ""));
    }

    #[test]
    fn dummy_hash_is_a_real_argon2_hash() {
        let hash = dummy_hash();
        assert!(hash.starts_with("$argon2"));
        assert!(PasswordHash::new(hash).is_ok());
        assert!(!password_matches("secret1", hash));
        assert_eq!(dummy_hash(), hash);
    }
}
