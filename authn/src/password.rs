//! Argon2 password hashing.
//!
//! Stored credentials are PHC strings (`$argon2id$v=19$...`), the format
//! written by `warden hash-password`.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{AuthnError, Result};

/// Hashes `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthnError::PasswordHash(e.to_string()))
}

/// Checks `password` against a stored PHC hash.
///
/// A wrong password is `Ok(false)`; a hash that cannot be parsed is an
/// error, since it means the store itself is broken.
pub fn verify_password(stored_hash: &str, password: &str) -> Result<bool> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|e| AuthnError::PasswordHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthnError::PasswordHash(e.to_string())),
    }
}

/// Runs [`verify_password`] on the blocking pool so hashing does not stall
/// the async workers.
pub async fn verify_password_blocking(stored_hash: String, password: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&stored_hash, &password))
        .await
        .map_err(|e| AuthnError::Internal(format!("password verification task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "correct horse").unwrap());
        assert!(!verify_password(&hash, "battery staple").unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        let err = verify_password("plaintext-password", "anything").unwrap_err();
        assert!(matches!(err, AuthnError::PasswordHash(_)));
    }

    #[tokio::test]
    async fn test_verify_blocking() {
        let hash = hash_password("pw").unwrap();
        assert!(verify_password_blocking(hash.clone(), "pw".into()).await.unwrap());
        assert!(!verify_password_blocking(hash, "nope".into()).await.unwrap());
    }
}
