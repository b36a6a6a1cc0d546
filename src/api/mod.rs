/// API routes and handlers
pub mod auth;
pub mod extract;
pub mod middleware;
pub mod notes;
pub mod plans;
pub mod support;
pub mod users;

use crate::context::AppContext;
use axum::Router;
use serde::Serialize;

/// Success envelope shared by every endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(data: T, message: &str) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.to_string()),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: &str) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.to_string()),
        }
    }
}

/// Build API routes
///
/// Everything except registration and login sits behind `require_auth`.
pub fn routes(ctx: AppContext) -> Router<AppContext> {
    let protected = Router::new()
        .merge(auth::protected_routes())
        .merge(users::routes())
        .merge(plans::routes())
        .merge(support::routes())
        .merge(notes::routes())
        .route_layer(axum::middleware::from_fn_with_state(
            ctx,
            middleware::require_auth,
        ));

    Router::new().merge(auth::public_routes()).merge(protected)
}
