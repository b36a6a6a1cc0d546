/// Database layer for the helpdesk
///
/// Manages the SQLite pool, migrations, and the uniform deadline applied to
/// every store call.

pub mod models;

use crate::error::{HelpdeskError, HelpdeskResult};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::future::Future;
use std::path::Path;
use std::time::Duration;

/// Database connection options
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub max_connections: u32,
    pub enable_wal: bool,
    pub timeout: Duration,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            enable_wal: true,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Create a SQLite connection pool
pub async fn create_pool(path: &Path, options: DatabaseOptions) -> HelpdeskResult<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let connect_options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(if options.enable_wal {
            SqliteJournalMode::Wal
        } else {
            SqliteJournalMode::Delete
        })
        .foreign_keys(true)
        .busy_timeout(options.timeout);

    let pool = SqlitePoolOptions::new()
        .max_connections(options.max_connections)
        .acquire_timeout(options.timeout)
        .connect_with(connect_options)
        .await?;

    Ok(pool)
}

/// Run migrations for a database
/// Migrations are embedded at compile time from ./migrations directory
pub async fn run_migrations(pool: &SqlitePool) -> HelpdeskResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| HelpdeskError::Internal(format!("Migration failed: {}", e)))?;

    Ok(())
}

/// Test database connection
pub async fn test_connection(pool: &SqlitePool) -> HelpdeskResult<()> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

/// Open a transaction that takes the write lock up front
///
/// A deferred transaction that has already read cannot upgrade once another
/// writer holds the lock and fails with `SQLITE_BUSY` without waiting.
/// `BEGIN IMMEDIATE` instead waits on the busy timeout.
pub async fn begin_write(pool: &SqlitePool) -> HelpdeskResult<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// Run a store operation under a fixed deadline
///
/// The connection or transaction owned by `operation` is dropped (and released or
/// rolled back) when the deadline fires.
pub async fn bounded<T, F>(deadline: Duration, operation: F) -> HelpdeskResult<T>
where
    F: Future<Output = HelpdeskResult<T>>,
{
    match tokio::time::timeout(deadline, operation).await {
        Ok(result) => result,
        Err(_) => Err(HelpdeskError::Internal(format!(
            "Store operation exceeded {:?} deadline",
            deadline
        ))),
    }
}
