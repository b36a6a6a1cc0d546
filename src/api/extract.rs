/// Request extractors that report rejections in the error envelope
use crate::error::HelpdeskError;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

/// JSON body; malformed or mistyped payloads become `400 BadRequest`
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = HelpdeskError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(HelpdeskError::Validation(rejection.body_text())),
        }
    }
}

/// Numeric `:id` path segment
pub struct IdParam(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for IdParam
where
    S: Send + Sync,
{
    type Rejection = HelpdeskError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|e| HelpdeskError::Validation(format!("Invalid id: {}", e.body_text())))?;

        Ok(IdParam(id))
    }
}
