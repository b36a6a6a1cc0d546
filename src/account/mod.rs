/// Account management system
///
/// Handles registration, login, and admin/self account maintenance.

mod manager;
pub mod password;

pub use manager::AccountManager;

use crate::{db::models::Account, policy::Role};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Treat a blank optional string as absent
pub(crate) fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Self-service registration request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub phone: String,
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub password: String,
}

impl RegisterRequest {
    /// Trim identifiers and store a missing or blank email as a true absence
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.phone = self.phone.trim().to_string();
        self.email = blank_to_none(self.email);
        self
    }
}

/// Admin-provisioned account request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub phone: String,
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub subscription_plan: Option<String>,
}

impl CreateAccountRequest {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.phone = self.phone.trim().to_string();
        self.email = blank_to_none(self.email);
        self.subscription_plan = blank_to_none(self.subscription_plan);
        self
    }
}

/// Login request (phone is the canonical identifier)
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub password: String,
}

/// Public view of an account returned at login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub role: Role,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            phone: account.phone.clone(),
            email: account.email.clone(),
            role: account.role,
        }
    }
}

/// Login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: AccountSummary,
}

/// Account update request
///
/// Absent fields are left unchanged; a blank `subscription_plan` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAccountRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subscription_plan: Option<String>,
}
