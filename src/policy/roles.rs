/// Account roles
use crate::error::{HelpdeskError, HelpdeskResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role carried by every account and every identity token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Customer account, owns support requests
    User,
    /// Manages accounts, plans and ticket workflow
    Admin,
    /// Technician, works assigned tickets and writes notes
    Tech,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Tech => "tech",
        }
    }

    pub fn from_str(s: &str) -> HelpdeskResult<Self> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "tech" => Ok(Role::Tech),
            _ => Err(HelpdeskError::Validation(format!("Invalid role: {}", s))),
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str() {
        assert_eq!(Role::from_str("user").unwrap(), Role::User);
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("tech").unwrap(), Role::Tech);
        assert_eq!(Role::from_str("ADMIN").unwrap(), Role::Admin);

        assert!(Role::from_str("superadmin").is_err());
        assert!(Role::from_str("").is_err());
    }

    #[test]
    fn test_role_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Tech).unwrap(), "\"tech\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }
}
