/// Technician note endpoints
use crate::{
    api::{
        extract::{IdParam, JsonBody},
        ApiResponse,
    },
    auth::AuthContext,
    context::AppContext,
    db::models::TechNote,
    error::HelpdeskResult,
    notes::AddNoteRequest,
};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/notes", post(add_note))
        .route("/api/notes/:id", get(list_notes))
}

async fn add_note(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    JsonBody(req): JsonBody<AddNoteRequest>,
) -> HelpdeskResult<Json<ApiResponse<TechNote>>> {
    let note = ctx.note_manager.add_note(&auth.claims, req).await?;
    Ok(Json(ApiResponse::with_message(note, "Note added")))
}

/// Notes for the support request `:id`
async fn list_notes(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    IdParam(request_id): IdParam,
) -> HelpdeskResult<Json<ApiResponse<Vec<TechNote>>>> {
    let notes = ctx.note_manager.list_notes(&auth.claims, request_id).await?;
    Ok(Json(ApiResponse::data(notes)))
}
