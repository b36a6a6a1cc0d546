/// Registration, login and identity endpoints
use crate::{
    account::{LoginRequest, LoginResponse, RegisterRequest},
    api::{extract::JsonBody, ApiResponse},
    auth::{AuthContext, Claims},
    context::AppContext,
    error::HelpdeskResult,
};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

/// Routes reachable without a token
pub fn public_routes() -> Router<AppContext> {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
}

pub fn protected_routes() -> Router<AppContext> {
    Router::new().route("/api/me", get(me))
}

async fn register(
    State(ctx): State<AppContext>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> HelpdeskResult<Json<ApiResponse<()>>> {
    let account = ctx.account_manager.register(req).await?;
    tracing::info!("Account {} registered", account.id);

    Ok(Json(ApiResponse::message("User registered successfully")))
}

async fn login(
    State(ctx): State<AppContext>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> HelpdeskResult<Json<ApiResponse<LoginResponse>>> {
    let response = ctx.account_manager.login(req).await?;
    Ok(Json(ApiResponse::data(response)))
}

/// The verified claim, without a store lookup
async fn me(auth: AuthContext) -> Json<ApiResponse<Claims>> {
    Json(ApiResponse::data(auth.claims))
}
