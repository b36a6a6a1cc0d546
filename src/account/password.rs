/// Password hashing (Argon2id, salted, default cost parameters)
use crate::error::{HelpdeskError, HelpdeskResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::OnceLock;

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> HelpdeskResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| HelpdeskError::Internal(format!("Password hashing failed: {}", e)))
}

/// Compare a password against a stored PHC hash string
pub fn verify_password(password: &str, stored_hash: &str) -> HelpdeskResult<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| HelpdeskError::Internal(format!("Stored password hash is invalid: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Hash computed once and verified against when the account does not exist,
/// so both login failure paths cost the same.
fn decoy_hash() -> &'static str {
    static DECOY: OnceLock<String> = OnceLock::new();
    DECOY.get_or_init(|| {
        hash_password("decoy-password-for-missing-accounts").unwrap_or_default()
    })
}

/// Hash on the blocking pool; Argon2 is deliberately CPU-heavy
pub async fn hash_password_blocking(password: String) -> HelpdeskResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| HelpdeskError::Internal(format!("Hashing task failed: {}", e)))?
}

/// Verify on the blocking pool. `None` runs against the decoy hash and always fails.
pub async fn verify_password_blocking(
    password: String,
    stored_hash: Option<String>,
) -> HelpdeskResult<bool> {
    tokio::task::spawn_blocking(move || match stored_hash {
        Some(hash) => verify_password(&password, &hash),
        None => {
            let decoy = decoy_hash();
            if !decoy.is_empty() {
                let _ = verify_password(&password, decoy);
            }
            Ok(false)
        }
    })
    .await
    .map_err(|e| HelpdeskError::Internal(format!("Verification task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("correct horse"));

        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_stored_hash() {
        assert!(verify_password("x", "not-a-phc-string").is_err());
    }

    #[tokio::test]
    async fn test_missing_account_never_verifies() {
        assert!(!verify_password_blocking("anything".to_string(), None)
            .await
            .unwrap());
    }
}
