/// Support request endpoints
use crate::{
    api::{
        extract::{IdParam, JsonBody},
        ApiResponse,
    },
    auth::AuthContext,
    context::AppContext,
    db::models::SupportTicket,
    error::HelpdeskResult,
    ticket::{CreateTicketRequest, UpdateTicketRequest},
};
use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/support", get(list_all).post(create_request))
        .route("/api/support/my", get(list_mine))
        .route("/api/support/assigned", get(list_assigned))
        .route("/api/support/:id", put(update_request))
}

async fn create_request(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    JsonBody(req): JsonBody<CreateTicketRequest>,
) -> HelpdeskResult<Json<ApiResponse<SupportTicket>>> {
    let ticket = ctx.ticket_manager.create_ticket(&auth.claims, req).await?;
    Ok(Json(ApiResponse::with_message(ticket, "Request created")))
}

async fn list_mine(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> HelpdeskResult<Json<ApiResponse<Vec<SupportTicket>>>> {
    let tickets = ctx.ticket_manager.list_own(&auth.claims).await?;
    Ok(Json(ApiResponse::data(tickets)))
}

async fn list_all(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> HelpdeskResult<Json<ApiResponse<Vec<SupportTicket>>>> {
    let tickets = ctx.ticket_manager.list_all(&auth.claims).await?;
    Ok(Json(ApiResponse::data(tickets)))
}

async fn list_assigned(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> HelpdeskResult<Json<ApiResponse<Vec<SupportTicket>>>> {
    let tickets = ctx.ticket_manager.list_assigned(&auth.claims).await?;
    Ok(Json(ApiResponse::data(tickets)))
}

/// Admin status/assignment change; notifications go out in the background
async fn update_request(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    IdParam(id): IdParam,
    JsonBody(req): JsonBody<UpdateTicketRequest>,
) -> HelpdeskResult<Json<ApiResponse<SupportTicket>>> {
    let outcome = ctx.ticket_manager.update_ticket(&auth.claims, id, req).await?;
    tracing::debug!(
        "Support request {} queued {} notification(s)",
        id,
        outcome.notifications.len()
    );

    Ok(Json(ApiResponse::with_message(outcome.ticket, "Request updated")))
}
