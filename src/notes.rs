/// Technician notes
///
/// Notes are an append-only audit trail on a support request. Only technicians
/// write them; any authenticated account may read the notes of a request.
use crate::{
    auth::Claims,
    db::{self, models::TechNote},
    error::{HelpdeskError, HelpdeskResult},
    policy::{self, Action},
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use std::time::Duration;
use validator::Validate;

/// Add-note request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddNoteRequest {
    #[validate(range(min = 1))]
    pub request_id: i64,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub note: String,
}

#[derive(Clone)]
pub struct NoteManager {
    db: SqlitePool,
    timeout: Duration,
}

impl NoteManager {
    pub fn new(db: SqlitePool, timeout: Duration) -> Self {
        Self { db, timeout }
    }

    /// Append a note authored by the calling technician
    pub async fn add_note(&self, claims: &Claims, mut req: AddNoteRequest) -> HelpdeskResult<TechNote> {
        policy::authorize(claims, Action::AddNote)?;

        req.note = req.note.trim().to_string();
        req.validate()?;

        db::bounded(self.timeout, async {
            let mut tx = db::begin_write(&self.db).await?;

            let exists: Option<i64> =
                sqlx::query_scalar("SELECT id FROM support_requests WHERE id = ?1")
                    .bind(req.request_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if exists.is_none() {
                return Err(HelpdeskError::NotFound("Support request not found".to_string()));
            }

            let note = sqlx::query_as::<_, TechNote>(
                "INSERT INTO tech_notes (request_id, technician_id, note, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 RETURNING id, request_id, technician_id, note, created_at",
            )
            .bind(req.request_id)
            .bind(claims.user_id)
            .bind(&req.note)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;

            tx.commit().await?;

            tracing::info!(
                "Technician {} added note {} to support request {}",
                claims.user_id,
                note.id,
                note.request_id
            );
            Ok(note)
        })
        .await
    }

    /// Notes for one request, oldest first
    pub async fn list_notes(&self, claims: &Claims, request_id: i64) -> HelpdeskResult<Vec<TechNote>> {
        policy::authorize(claims, Action::ListNotes)?;

        db::bounded(self.timeout, async {
            let notes = sqlx::query_as::<_, TechNote>(
                "SELECT id, request_id, technician_id, note, created_at
                 FROM tech_notes WHERE request_id = ?1 ORDER BY id ASC",
            )
            .bind(request_id)
            .fetch_all(&self.db)
            .await?;

            Ok(notes)
        })
        .await
    }
}
