/// Authentication extractors and utilities
mod token;

pub use token::{TokenCodec, TokenError};

use crate::{context::AppContext, error::HelpdeskError, policy::Role};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity facts recovered from a verified token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub role: Role,
}

/// Reasons a request is rejected as unauthenticated
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Invalid authorization format")]
    MalformedAuth,

    #[error("Invalid token: {0}")]
    Token(#[from] TokenError),
}

impl From<AuthError> for HelpdeskError {
    fn from(err: AuthError) -> Self {
        HelpdeskError::Authentication(err.to_string())
    }
}

/// Extract the raw token from an `Authorization: Bearer <token>` header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers.get(AUTHORIZATION).ok_or(AuthError::MissingAuth)?;
    let value = value.to_str().map_err(|_| AuthError::MalformedAuth)?;

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MalformedAuth),
    }
}

/// Recover the caller's identity from request headers
pub fn resolve(headers: &HeaderMap, codec: &TokenCodec) -> Result<Claims, AuthError> {
    let token = extract_bearer_token(headers)?;
    Ok(codec.verify(token)?)
}

/// Authenticated context
///
/// Reads the claims attached by the `require_auth` middleware. Handlers never
/// verify tokens themselves.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub claims: Claims,
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthContext {
    type Rejection = HelpdeskError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<Claims>()
            .copied()
            .ok_or(AuthError::MissingAuth)?;

        Ok(AuthContext { claims })
    }
}
