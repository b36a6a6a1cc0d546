/// Identity token codec
///
/// Tokens are HS256 JWTs carrying `{user_id, role, iat, exp}`. The signing key is
/// injected through [`TokenCodec::new`] so tests can pin a fixed key.
use super::Claims;
use crate::{
    config::AuthConfig,
    error::{HelpdeskError, HelpdeskResult},
    policy::Role,
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Reasons a token fails verification
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Malformed token")]
    Malformed,
}

/// Wire form of the signed claim set
#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    user_id: i64,
    role: Role,
    iat: i64,
    exp: i64,
}

/// Issues and verifies identity tokens
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: chrono::Duration,
}

impl TokenCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> HelpdeskResult<Self> {
        if secret.is_empty() {
            return Err(HelpdeskError::Internal("Token signing key is empty".to_string()));
        }

        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| HelpdeskError::Internal(format!("Invalid token lifetime: {}", e)))?;

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact: no clock skew allowance
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        })
    }

    pub fn from_config(config: &AuthConfig) -> HelpdeskResult<Self> {
        Self::new(config.jwt_secret.as_bytes(), config.token_ttl)
    }

    /// Issue a token valid from now until now + ttl
    pub fn issue(&self, user_id: i64, role: Role) -> HelpdeskResult<String> {
        self.issue_at(user_id, role, Utc::now())
    }

    /// Issue a token as if it had been created at `issued_at`
    pub fn issue_at(
        &self,
        user_id: i64,
        role: Role,
        issued_at: DateTime<Utc>,
    ) -> HelpdeskResult<String> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| HelpdeskError::Internal("Token expiry is out of range".to_string()))?;
        let claims = TokenClaims {
            user_id,
            role,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| HelpdeskError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Verify signature and expiry, returning only the trusted identity facts
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| {
                tracing::debug!("Token verification failed: {}", e);
                match e.kind() {
                    ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Malformed,
                }
            },
        )?;

        Ok(Claims {
            user_id: data.claims.user_id,
            role: data.claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-key-for-testing-only-0123456789";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, Duration::from_secs(72 * 3600)).unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let codec = codec();
        let token = codec.issue(42, Role::Tech).unwrap();

        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.role, Role::Tech);
    }

    #[test]
    fn test_expired_token() {
        let codec = codec();
        let issued_at = Utc::now() - chrono::Duration::hours(73);
        let token = codec.issue_at(1, Role::User, issued_at).unwrap();

        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_token_still_valid_inside_window() {
        let codec = codec();
        let issued_at = Utc::now() - chrono::Duration::hours(71);
        let token = codec.issue_at(1, Role::User, issued_at).unwrap();

        assert!(codec.verify(&token).is_ok());
    }

    #[test]
    fn test_foreign_key_is_rejected() {
        let other = TokenCodec::new(
            b"another-secret-key-that-is-long-enough-000",
            Duration::from_secs(3600),
        )
        .unwrap();
        let token = other.issue(1, Role::Admin).unwrap();

        assert_eq!(codec().verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = codec();
        assert_eq!(codec.verify("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(codec.verify(""), Err(TokenError::Malformed));
        assert_eq!(codec.verify("a.b.c"), Err(TokenError::Malformed));
    }

    #[test]
    fn test_unknown_role_is_malformed() {
        #[derive(Serialize)]
        struct Forged {
            user_id: i64,
            role: &'static str,
            iat: i64,
            exp: i64,
        }

        let now = Utc::now().timestamp();
        let forged = Forged {
            user_id: 1,
            role: "superuser",
            iat: now,
            exp: now + 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &forged,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(codec().verify(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(TokenCodec::new(b"", Duration::from_secs(60)).is_err());
    }
}
