/// Account endpoints
use crate::{
    account::{CreateAccountRequest, UpdateAccountRequest},
    api::{
        extract::{IdParam, JsonBody},
        ApiResponse,
    },
    auth::AuthContext,
    context::AppContext,
    db::models::Account,
    error::HelpdeskResult,
};
use axum::{
    extract::State,
    routing::get,
    Json, Router,
};

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

async fn list_users(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> HelpdeskResult<Json<ApiResponse<Vec<Account>>>> {
    let accounts = ctx.account_manager.list_accounts(&auth.claims).await?;
    Ok(Json(ApiResponse::data(accounts)))
}

async fn create_user(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    JsonBody(req): JsonBody<CreateAccountRequest>,
) -> HelpdeskResult<Json<ApiResponse<Account>>> {
    let account = ctx.account_manager.create_account(&auth.claims, req).await?;
    Ok(Json(ApiResponse::with_message(account, "User created")))
}

async fn get_user(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    IdParam(id): IdParam,
) -> HelpdeskResult<Json<ApiResponse<Account>>> {
    let account = ctx.account_manager.get_account(&auth.claims, id).await?;
    Ok(Json(ApiResponse::data(account)))
}

async fn update_user(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    IdParam(id): IdParam,
    JsonBody(req): JsonBody<UpdateAccountRequest>,
) -> HelpdeskResult<Json<ApiResponse<Account>>> {
    let account = ctx.account_manager.update_account(&auth.claims, id, req).await?;
    Ok(Json(ApiResponse::with_message(account, "User updated")))
}

async fn delete_user(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    IdParam(id): IdParam,
) -> HelpdeskResult<Json<ApiResponse<()>>> {
    ctx.account_manager.delete_account(&auth.claims, id).await?;
    Ok(Json(ApiResponse::message("User deleted")))
}
