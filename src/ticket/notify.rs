/// Ticket notification trigger
///
/// Decides which emails a committed ticket update produces. Sending is left to
/// the `NotificationDispatcher`.
use crate::{db::models::SupportTicket, mailer::Email};

/// A notification owed after a ticket update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketNotification {
    /// The ticket was handed to a (different) technician
    Assigned { ticket_id: i64, to: String },
    /// The ticket was saved by an admin; tells the owner its current status
    StatusChanged {
        ticket_id: i64,
        to: String,
        status: String,
    },
}

impl TicketNotification {
    pub fn into_email(self) -> Email {
        match self {
            TicketNotification::Assigned { ticket_id, to } => Email {
                to,
                subject: "A new support request has been assigned to you".to_string(),
                body: format!("Support request #{} has been assigned to you.", ticket_id),
            },
            TicketNotification::StatusChanged {
                ticket_id,
                to,
                status,
            } => Email {
                to,
                subject: "Your support request status has changed".to_string(),
                body: format!(
                    "The status of support request #{} has changed: {}",
                    ticket_id, status
                ),
            },
        }
    }
}

/// Whether an update moved the ticket to a new technician
pub fn assigned_to_new_technician(previous: Option<i64>, current: Option<i64>) -> bool {
    current.is_some() && previous != current
}

/// Notifications for an update that changed `previous_assignee` into `ticket.assigned_to`
///
/// Recipients without an email address are skipped.
pub fn notifications_for_update(
    ticket: &SupportTicket,
    previous_assignee: Option<i64>,
    assignee_email: Option<&str>,
    owner_email: Option<&str>,
) -> Vec<TicketNotification> {
    let mut notifications = Vec::new();

    if assigned_to_new_technician(previous_assignee, ticket.assigned_to) {
        if let Some(to) = assignee_email.filter(|e| !e.is_empty()) {
            notifications.push(TicketNotification::Assigned {
                ticket_id: ticket.id,
                to: to.to_string(),
            });
        }
    }

    if let Some(to) = owner_email.filter(|e| !e.is_empty()) {
        notifications.push(TicketNotification::StatusChanged {
            ticket_id: ticket.id,
            to: to.to_string(),
            status: ticket.status.clone(),
        });
    }

    notifications
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ticket(assigned_to: Option<i64>, status: &str) -> SupportTicket {
        SupportTicket {
            id: 5,
            user_id: 1,
            title: "VPN".to_string(),
            description: "Cannot connect".to_string(),
            category: "network".to_string(),
            status: status.to_string(),
            assigned_to,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_assignment_change_detection() {
        assert!(assigned_to_new_technician(None, Some(3)));
        assert!(assigned_to_new_technician(Some(2), Some(3)));
        assert!(!assigned_to_new_technician(Some(3), Some(3)));
        // Clearing an assignment leaves nobody to notify
        assert!(!assigned_to_new_technician(Some(3), None));
        assert!(!assigned_to_new_technician(None, None));
    }

    #[test]
    fn test_new_assignment_notifies_tech_and_owner() {
        let notes = notifications_for_update(
            &ticket(Some(3), "in_progress"),
            None,
            Some("tech@example.com"),
            Some("owner@example.com"),
        );

        assert_eq!(
            notes,
            vec![
                TicketNotification::Assigned {
                    ticket_id: 5,
                    to: "tech@example.com".to_string()
                },
                TicketNotification::StatusChanged {
                    ticket_id: 5,
                    to: "owner@example.com".to_string(),
                    status: "in_progress".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_unchanged_assignee_only_notifies_owner() {
        let notes = notifications_for_update(
            &ticket(Some(3), "closed"),
            Some(3),
            Some("tech@example.com"),
            Some("owner@example.com"),
        );

        assert_eq!(notes.len(), 1);
        assert!(matches!(notes[0], TicketNotification::StatusChanged { .. }));
    }

    #[test]
    fn test_missing_emails_are_skipped() {
        let notes = notifications_for_update(&ticket(Some(3), "open"), None, None, Some(""));
        assert!(notes.is_empty());
    }

    #[test]
    fn test_email_rendering() {
        let email = TicketNotification::StatusChanged {
            ticket_id: 9,
            to: "o@example.com".to_string(),
            status: "resolved".to_string(),
        }
        .into_email();

        assert_eq!(email.to, "o@example.com");
        assert!(email.body.contains("#9"));
        assert!(email.body.contains("resolved"));
    }
}
