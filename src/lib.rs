/// Helpdesk - role-based IT support backend
///
/// Accounts, subscription plans, support requests and technician notes behind a
/// token-authenticated JSON API, with best-effort email notifications on
/// ticket updates.

pub mod account;
pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod mailer;
pub mod notes;
pub mod plan;
pub mod policy;
pub mod server;
pub mod ticket;

pub use context::AppContext;
pub use error::{HelpdeskError, HelpdeskResult};
