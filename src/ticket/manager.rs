/// Ticket manager
use super::{
    notify::{self, TicketNotification},
    CreateTicketRequest, UpdateTicketRequest,
};
use crate::{
    auth::Claims,
    db::{self, models::SupportTicket},
    error::{HelpdeskError, HelpdeskResult},
    mailer::NotificationDispatcher,
    policy::{self, Action, Role},
};
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::time::Duration;
use tokio::task::JoinHandle;
use validator::Validate;

/// Result of a committed ticket update
#[derive(Debug)]
pub struct TicketUpdateOutcome {
    pub ticket: SupportTicket,
    pub notifications: Vec<TicketNotification>,
    /// Background delivery task; dropping it does not cancel delivery
    pub delivery: JoinHandle<()>,
}

/// Ticket service
#[derive(Clone)]
pub struct TicketManager {
    db: SqlitePool,
    dispatcher: NotificationDispatcher,
    timeout: Duration,
}

impl TicketManager {
    pub fn new(db: SqlitePool, dispatcher: NotificationDispatcher, timeout: Duration) -> Self {
        Self {
            db,
            dispatcher,
            timeout,
        }
    }

    /// Open a ticket owned by the caller; status comes from the store default
    pub async fn create_ticket(
        &self,
        claims: &Claims,
        req: CreateTicketRequest,
    ) -> HelpdeskResult<SupportTicket> {
        policy::authorize(claims, Action::CreateTicket)?;

        let req = req.normalized();
        req.validate()?;

        db::bounded(self.timeout, async {
            let now = Utc::now();
            let ticket = sqlx::query_as::<_, SupportTicket>(&format!(
                "INSERT INTO support_requests (user_id, title, description, category, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 RETURNING {}",
                SupportTicket::COLUMNS
            ))
            .bind(claims.user_id)
            .bind(&req.title)
            .bind(&req.description)
            .bind(&req.category)
            .bind(now)
            .fetch_one(&self.db)
            .await?;

            tracing::info!("Support request {} opened by {}", ticket.id, claims.user_id);
            Ok(ticket)
        })
        .await
    }

    /// Tickets owned by the caller
    pub async fn list_own(&self, claims: &Claims) -> HelpdeskResult<Vec<SupportTicket>> {
        policy::authorize(claims, Action::ListOwnTickets)?;
        self.list_where("user_id = ?1", Some(claims.user_id)).await
    }

    /// Every ticket (admin only)
    pub async fn list_all(&self, claims: &Claims) -> HelpdeskResult<Vec<SupportTicket>> {
        policy::authorize(claims, Action::ListAllTickets)?;
        self.list_where("1 = 1", None).await
    }

    /// Tickets assigned to the calling technician
    pub async fn list_assigned(&self, claims: &Claims) -> HelpdeskResult<Vec<SupportTicket>> {
        policy::authorize(claims, Action::ListAssignedTickets)?;
        self.list_where("assigned_to = ?1", Some(claims.user_id)).await
    }

    async fn list_where(
        &self,
        filter: &str,
        account_id: Option<i64>,
    ) -> HelpdeskResult<Vec<SupportTicket>> {
        db::bounded(self.timeout, async {
            let sql = format!(
                "SELECT {} FROM support_requests WHERE {} ORDER BY id ASC",
                SupportTicket::COLUMNS,
                filter
            );
            let mut query = sqlx::query_as::<_, SupportTicket>(&sql);
            if let Some(id) = account_id {
                query = query.bind(id);
            }

            Ok(query.fetch_all(&self.db).await?)
        })
        .await
    }

    /// Change status and/or assignment (admin only)
    ///
    /// The previous assignee is read, the row rewritten, and the recipients looked
    /// up in one transaction. Notifications are dispatched only after commit and
    /// their outcome never affects the result.
    pub async fn update_ticket(
        &self,
        claims: &Claims,
        ticket_id: i64,
        req: UpdateTicketRequest,
    ) -> HelpdeskResult<TicketUpdateOutcome> {
        policy::authorize(claims, Action::UpdateTicket)?;

        let status = match req.status {
            Some(status) => {
                let status = status.trim().to_string();
                if status.is_empty() {
                    return Err(HelpdeskError::Validation("Status cannot be empty".to_string()));
                }
                Some(status)
            }
            None => None,
        };
        if status.is_none() && req.assigned_to.is_none() {
            return Err(HelpdeskError::Validation(
                "Nothing to update: provide status or assigned_to".to_string(),
            ));
        }

        let (ticket, previous_assignee, assignee_email, owner_email) =
            db::bounded(self.timeout, async {
                let mut tx = db::begin_write(&self.db).await?;

                let previous: Option<(String, Option<i64>)> = sqlx::query_as(
                    "SELECT status, assigned_to FROM support_requests WHERE id = ?1",
                )
                .bind(ticket_id)
                .fetch_optional(&mut *tx)
                .await?;
                let (previous_status, previous_assignee) = previous
                    .ok_or_else(|| HelpdeskError::NotFound("Support request not found".to_string()))?;

                let assigned_to = match req.assigned_to {
                    Some(Some(tech_id)) => {
                        Self::ensure_technician(&mut tx, tech_id).await?;
                        Some(tech_id)
                    }
                    Some(None) => None,
                    None => previous_assignee,
                };
                let status = status.unwrap_or(previous_status);

                let ticket = sqlx::query_as::<_, SupportTicket>(&format!(
                    "UPDATE support_requests SET status = ?1, assigned_to = ?2, updated_at = ?3
                     WHERE id = ?4
                     RETURNING {}",
                    SupportTicket::COLUMNS
                ))
                .bind(&status)
                .bind(assigned_to)
                .bind(Utc::now())
                .bind(ticket_id)
                .fetch_one(&mut *tx)
                .await?;

                let assignee_email = match ticket.assigned_to {
                    Some(tech_id)
                        if notify::assigned_to_new_technician(previous_assignee, Some(tech_id)) =>
                    {
                        Self::email_of(&mut tx, tech_id).await?
                    }
                    _ => None,
                };
                let owner_email = Self::email_of(&mut tx, ticket.user_id).await?;

                tx.commit().await?;
                Ok((ticket, previous_assignee, assignee_email, owner_email))
            })
            .await?;

        tracing::info!(
            "Support request {} updated by admin {}: status={}, assigned_to={:?} (was {:?})",
            ticket.id,
            claims.user_id,
            ticket.status,
            ticket.assigned_to,
            previous_assignee
        );

        let notifications = notify::notifications_for_update(
            &ticket,
            previous_assignee,
            assignee_email.as_deref(),
            owner_email.as_deref(),
        );
        let delivery = self.dispatcher.dispatch(
            notifications
                .iter()
                .cloned()
                .map(TicketNotification::into_email)
                .collect(),
        );

        Ok(TicketUpdateOutcome {
            ticket,
            notifications,
            delivery,
        })
    }

    /// Assignees must be existing technician accounts
    async fn ensure_technician(
        tx: &mut Transaction<'_, Sqlite>,
        account_id: i64,
    ) -> HelpdeskResult<()> {
        let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE id = ?1")
            .bind(account_id)
            .fetch_optional(&mut **tx)
            .await?;

        match role.as_deref().map(Role::from_str) {
            Some(Ok(Role::Tech)) => Ok(()),
            Some(_) => Err(HelpdeskError::Validation(format!(
                "Account {} is not a technician",
                account_id
            ))),
            None => Err(HelpdeskError::Validation(format!(
                "Assigned technician {} does not exist",
                account_id
            ))),
        }
    }

    async fn email_of(
        tx: &mut Transaction<'_, Sqlite>,
        account_id: i64,
    ) -> HelpdeskResult<Option<String>> {
        let email: Option<Option<String>> =
            sqlx::query_scalar("SELECT email FROM users WHERE id = ?1")
                .bind(account_id)
                .fetch_optional(&mut **tx)
                .await?;

        Ok(email.flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::test_pool;
    use crate::mailer::tests::RecordingNotifier;
    use std::sync::Arc;

    struct Fixture {
        manager: TicketManager,
        recorder: Arc<RecordingNotifier>,
        pool: SqlitePool,
        _dir: tempfile::TempDir,
    }

    async fn fixture_with(recorder: RecordingNotifier) -> Fixture {
        let (pool, dir) = test_pool().await;
        let recorder = Arc::new(recorder);
        let manager = TicketManager::new(
            pool.clone(),
            NotificationDispatcher::new(recorder.clone()),
            Duration::from_secs(5),
        );
        Fixture {
            manager,
            recorder,
            pool,
            _dir: dir,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(RecordingNotifier::default()).await
    }

    async fn insert_account(pool: &SqlitePool, phone: &str, email: Option<&str>, role: Role) -> i64 {
        sqlx::query(
            "INSERT INTO users (name, phone, email, password_hash, role, created_at)
             VALUES ('Someone', ?1, ?2, 'x', ?3, ?4)",
        )
        .bind(phone)
        .bind(email)
        .bind(role.as_str())
        .bind(Utc::now())
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
    }

    fn claims(user_id: i64, role: Role) -> Claims {
        Claims { user_id, role }
    }

    fn new_ticket() -> CreateTicketRequest {
        CreateTicketRequest {
            title: "Laptop won't boot".to_string(),
            description: "Black screen after update".to_string(),
            category: "hardware".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_ticket_sets_owner_and_default_status() {
        let f = fixture().await;
        let owner = insert_account(&f.pool, "1", None, Role::User).await;

        let ticket = f
            .manager
            .create_ticket(&claims(owner, Role::User), new_ticket())
            .await
            .unwrap();

        assert_eq!(ticket.user_id, owner);
        assert_eq!(ticket.status, "open");
        assert_eq!(ticket.assigned_to, None);
    }

    #[tokio::test]
    async fn test_ticket_listing_scopes() {
        let f = fixture().await;
        let alice = insert_account(&f.pool, "1", None, Role::User).await;
        let bob = insert_account(&f.pool, "2", None, Role::User).await;
        let tech = insert_account(&f.pool, "3", None, Role::Tech).await;
        let admin = claims(99, Role::Admin);

        let a = f.manager.create_ticket(&claims(alice, Role::User), new_ticket()).await.unwrap();
        f.manager.create_ticket(&claims(bob, Role::User), new_ticket()).await.unwrap();

        let mine = f.manager.list_own(&claims(alice, Role::User)).await.unwrap();
        assert_eq!(mine.iter().map(|t| t.id).collect::<Vec<_>>(), vec![a.id]);

        assert!(matches!(
            f.manager.list_all(&claims(alice, Role::User)).await,
            Err(HelpdeskError::Authorization(_))
        ));
        assert_eq!(f.manager.list_all(&admin).await.unwrap().len(), 2);

        assert!(matches!(
            f.manager.list_assigned(&claims(alice, Role::User)).await,
            Err(HelpdeskError::Authorization(_))
        ));
        assert!(f.manager.list_assigned(&claims(tech, Role::Tech)).await.unwrap().is_empty());

        f.manager
            .update_ticket(
                &admin,
                a.id,
                UpdateTicketRequest {
                    status: None,
                    assigned_to: Some(Some(tech)),
                },
            )
            .await
            .unwrap();
        let assigned = f.manager.list_assigned(&claims(tech, Role::Tech)).await.unwrap();
        assert_eq!(assigned.iter().map(|t| t.id).collect::<Vec<_>>(), vec![a.id]);
    }

    #[tokio::test]
    async fn test_first_assignment_notifies_tech_and_owner() {
        let f = fixture().await;
        let owner = insert_account(&f.pool, "1", Some("owner@example.com"), Role::User).await;
        let tech = insert_account(&f.pool, "2", Some("tech@example.com"), Role::Tech).await;
        let ticket = f.manager.create_ticket(&claims(owner, Role::User), new_ticket()).await.unwrap();

        let outcome = f
            .manager
            .update_ticket(
                &claims(99, Role::Admin),
                ticket.id,
                UpdateTicketRequest {
                    status: Some("assigned".to_string()),
                    assigned_to: Some(Some(tech)),
                },
            )
            .await
            .unwrap();
        outcome.delivery.await.unwrap();

        assert_eq!(outcome.ticket.assigned_to, Some(tech));
        assert_eq!(outcome.ticket.status, "assigned");

        let sent = f.recorder.emails();
        let recipients: Vec<&str> = sent.iter().map(|e| e.to.as_str()).collect();
        assert_eq!(recipients, vec!["tech@example.com", "owner@example.com"]);
    }

    #[tokio::test]
    async fn test_same_assignee_only_notifies_owner() {
        let f = fixture().await;
        let owner = insert_account(&f.pool, "1", Some("owner@example.com"), Role::User).await;
        let tech = insert_account(&f.pool, "2", Some("tech@example.com"), Role::Tech).await;
        let admin = claims(99, Role::Admin);
        let ticket = f.manager.create_ticket(&claims(owner, Role::User), new_ticket()).await.unwrap();

        f.manager
            .update_ticket(
                &admin,
                ticket.id,
                UpdateTicketRequest {
                    status: Some("assigned".to_string()),
                    assigned_to: Some(Some(tech)),
                },
            )
            .await
            .unwrap()
            .delivery
            .await
            .unwrap();

        let outcome = f
            .manager
            .update_ticket(
                &admin,
                ticket.id,
                UpdateTicketRequest {
                    status: Some("resolved".to_string()),
                    assigned_to: Some(Some(tech)),
                },
            )
            .await
            .unwrap();
        outcome.delivery.await.unwrap();

        assert_eq!(outcome.notifications.len(), 1);
        assert!(matches!(
            outcome.notifications[0],
            TicketNotification::StatusChanged { .. }
        ));

        // 2 from the first update, 1 from the second
        let sent = f.recorder.emails();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[2].to, "owner@example.com");
        assert!(sent[2].body.contains("resolved"));
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_fail_update() {
        let f = fixture_with(RecordingNotifier::failing()).await;
        let owner = insert_account(&f.pool, "1", Some("owner@example.com"), Role::User).await;
        let tech = insert_account(&f.pool, "2", Some("tech@example.com"), Role::Tech).await;
        let ticket = f.manager.create_ticket(&claims(owner, Role::User), new_ticket()).await.unwrap();

        let outcome = f
            .manager
            .update_ticket(
                &claims(99, Role::Admin),
                ticket.id,
                UpdateTicketRequest {
                    status: Some("in_progress".to_string()),
                    assigned_to: Some(Some(tech)),
                },
            )
            .await
            .unwrap();
        outcome.delivery.await.unwrap();

        assert_eq!(f.recorder.emails().len(), 2);
        let stored: Option<i64> =
            sqlx::query_scalar("SELECT assigned_to FROM support_requests WHERE id = ?1")
                .bind(ticket.id)
                .fetch_one(&f.pool)
                .await
                .unwrap();
        assert_eq!(stored, Some(tech));
    }

    #[tokio::test]
    async fn test_null_clears_assignment_and_absent_keeps_it() {
        let f = fixture().await;
        let owner = insert_account(&f.pool, "1", None, Role::User).await;
        let tech = insert_account(&f.pool, "2", None, Role::Tech).await;
        let admin = claims(99, Role::Admin);
        let ticket = f.manager.create_ticket(&claims(owner, Role::User), new_ticket()).await.unwrap();

        let assign = UpdateTicketRequest {
            status: None,
            assigned_to: Some(Some(tech)),
        };
        f.manager.update_ticket(&admin, ticket.id, assign).await.unwrap();

        let keep = UpdateTicketRequest {
            status: Some("waiting".to_string()),
            assigned_to: None,
        };
        let kept = f.manager.update_ticket(&admin, ticket.id, keep).await.unwrap();
        assert_eq!(kept.ticket.assigned_to, Some(tech));
        assert_eq!(kept.ticket.status, "waiting");

        let clear = UpdateTicketRequest {
            status: None,
            assigned_to: Some(None),
        };
        let cleared = f.manager.update_ticket(&admin, ticket.id, clear).await.unwrap();
        assert_eq!(cleared.ticket.assigned_to, None);
        assert_eq!(cleared.ticket.status, "waiting");
        // No owner email, no assignee: nothing to send
        assert!(cleared.notifications.is_empty());
    }

    #[tokio::test]
    async fn test_update_rules() {
        let f = fixture().await;
        let owner = insert_account(&f.pool, "1", None, Role::User).await;
        let not_tech = insert_account(&f.pool, "2", None, Role::User).await;
        let admin = claims(99, Role::Admin);
        let ticket = f.manager.create_ticket(&claims(owner, Role::User), new_ticket()).await.unwrap();

        let status = |s: &str| UpdateTicketRequest {
            status: Some(s.to_string()),
            assigned_to: None,
        };

        assert!(matches!(
            f.manager.update_ticket(&claims(owner, Role::User), ticket.id, status("closed")).await,
            Err(HelpdeskError::Authorization(_))
        ));
        assert!(matches!(
            f.manager.update_ticket(&admin, 4040, status("closed")).await,
            Err(HelpdeskError::NotFound(_))
        ));
        assert!(matches!(
            f.manager
                .update_ticket(&admin, ticket.id, UpdateTicketRequest::default())
                .await,
            Err(HelpdeskError::Validation(_))
        ));
        assert!(matches!(
            f.manager
                .update_ticket(
                    &admin,
                    ticket.id,
                    UpdateTicketRequest {
                        status: None,
                        assigned_to: Some(Some(not_tech)),
                    },
                )
                .await,
            Err(HelpdeskError::Validation(_))
        ));
        assert!(matches!(
            f.manager
                .update_ticket(
                    &admin,
                    ticket.id,
                    UpdateTicketRequest {
                        status: None,
                        assigned_to: Some(Some(12345)),
                    },
                )
                .await,
            Err(HelpdeskError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_updates_on_distinct_tickets_all_succeed() {
        let f = fixture().await;
        let owner = insert_account(&f.pool, "1", None, Role::User).await;

        let mut ids = Vec::new();
        for _ in 0..20 {
            let ticket = f
                .manager
                .create_ticket(&claims(owner, Role::User), new_ticket())
                .await
                .unwrap();
            ids.push(ticket.id);
        }

        let mut tasks = tokio::task::JoinSet::new();
        for id in ids.clone() {
            let manager = f.manager.clone();
            tasks.spawn(async move {
                manager
                    .update_ticket(
                        &claims(99, Role::Admin),
                        id,
                        UpdateTicketRequest {
                            status: Some("closed".to_string()),
                            assigned_to: None,
                        },
                    )
                    .await
                    .map(|outcome| outcome.ticket.status)
            });
        }

        while let Some(result) = tasks.join_next().await {
            assert_eq!(result.unwrap().unwrap(), "closed");
        }

        let closed: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM support_requests WHERE status = 'closed'")
                .fetch_one(&f.pool)
                .await
                .unwrap();
        assert_eq!(closed, ids.len() as i64);
    }
}
