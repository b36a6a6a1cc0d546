/// Authentication middleware
use crate::{auth, context::AppContext, error::HelpdeskError};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Verify the bearer token and attach the caller's claims to the request
///
/// Missing, malformed, forged and expired tokens are all rejected with 401.
pub async fn require_auth(
    State(ctx): State<AppContext>,
    mut req: Request,
    next: Next,
) -> Result<Response, HelpdeskError> {
    let claims = auth::resolve(req.headers(), &ctx.tokens).map_err(|e| {
        tracing::debug!("Rejected {} {}: {}", req.method(), req.uri().path(), e);
        e
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
