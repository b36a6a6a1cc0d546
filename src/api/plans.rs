/// Subscription plan endpoints
use crate::{
    api::{
        extract::{IdParam, JsonBody},
        ApiResponse,
    },
    auth::AuthContext,
    context::AppContext,
    db::models::Plan,
    error::HelpdeskResult,
    plan::PlanRequest,
};
use axum::{
    extract::State,
    routing::get,
    Json, Router,
};

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/plans", get(list_plans).post(create_plan))
        .route(
            "/api/plans/:id",
            get(get_plan).put(update_plan).delete(delete_plan),
        )
}

async fn list_plans(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> HelpdeskResult<Json<ApiResponse<Vec<Plan>>>> {
    let plans = ctx.plan_manager.list_plans(&auth.claims).await?;
    Ok(Json(ApiResponse::data(plans)))
}

async fn get_plan(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    IdParam(id): IdParam,
) -> HelpdeskResult<Json<ApiResponse<Plan>>> {
    let plan = ctx.plan_manager.get_plan(&auth.claims, id).await?;
    Ok(Json(ApiResponse::data(plan)))
}

async fn create_plan(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    JsonBody(req): JsonBody<PlanRequest>,
) -> HelpdeskResult<Json<ApiResponse<Plan>>> {
    let plan = ctx.plan_manager.create_plan(&auth.claims, req).await?;
    Ok(Json(ApiResponse::with_message(plan, "Plan created")))
}

async fn update_plan(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    IdParam(id): IdParam,
    JsonBody(req): JsonBody<PlanRequest>,
) -> HelpdeskResult<Json<ApiResponse<Plan>>> {
    let plan = ctx.plan_manager.update_plan(&auth.claims, id, req).await?;
    Ok(Json(ApiResponse::with_message(plan, "Plan updated")))
}

async fn delete_plan(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    IdParam(id): IdParam,
) -> HelpdeskResult<Json<ApiResponse<()>>> {
    ctx.plan_manager.delete_plan(&auth.claims, id).await?;
    Ok(Json(ApiResponse::message("Plan deleted")))
}
