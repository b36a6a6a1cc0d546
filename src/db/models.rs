/// Database records
use crate::{
    error::{HelpdeskError, HelpdeskResult},
    policy::Role,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row};

/// Account record in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub phone: String,
    /// `None` when the account registered without an email
    pub email: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub subscription_plan: Option<String>,
    pub subscription_start: Option<DateTime<Utc>>,
    pub subscription_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub(crate) const COLUMNS: &'static str = "id, name, phone, email, password_hash, role, \
         subscription_plan, subscription_start, subscription_end, created_at";

    pub(crate) fn from_row(row: &SqliteRow) -> HelpdeskResult<Self> {
        let role: String = row.try_get("role")?;
        let role = Role::from_str(&role)
            .map_err(|_| HelpdeskError::Internal(format!("Unknown role stored: {}", role)))?;

        Ok(Account {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            phone: row.try_get("phone")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            role,
            subscription_plan: row.try_get("subscription_plan")?,
            subscription_start: row.try_get("subscription_start")?,
            subscription_end: row.try_get("subscription_end")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Subscription plan record
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Plan {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub remote_calls: i64,
    pub onsite_calls: i64,
}

/// Support request (ticket) record
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct SupportTicket {
    pub id: i64,
    /// Owner account
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub status: String,
    /// Assigned technician account
    pub assigned_to: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SupportTicket {
    pub(crate) const COLUMNS: &'static str =
        "id, user_id, title, description, category, status, assigned_to, created_at, updated_at";
}

/// Technician note record (append-only)
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct TechNote {
    pub id: i64,
    pub request_id: i64,
    pub technician_id: i64,
    pub note: String,
    pub created_at: DateTime<Utc>,
}
