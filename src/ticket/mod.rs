/// Support requests (tickets)
///
/// Any account may open a ticket and becomes its owner. Only admins change status
/// or assignment, and each committed change fans out best-effort email
/// notifications.

mod manager;
pub mod notify;

pub use manager::{TicketManager, TicketUpdateOutcome};

use serde::{Deserialize, Deserializer};
use validator::Validate;

/// New ticket request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTicketRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub description: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub category: String,
}

impl CreateTicketRequest {
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.description = self.description.trim().to_string();
        self.category = self.category.trim().to_string();
        self
    }
}

/// Ticket update request
///
/// `assigned_to` distinguishes three cases: absent (keep), `null` (clear),
/// and an account id (assign).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTicketRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub assigned_to: Option<Option<i64>>,
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}
