/// Application context and dependency injection
use crate::{
    account::AccountManager,
    auth::TokenCodec,
    config::ServerConfig,
    db,
    error::HelpdeskResult,
    mailer::{Mailer, NotificationDispatcher, Notifier},
    notes::NoteManager,
    plan::PlanManager,
    ticket::TicketManager,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub tokens: Arc<TokenCodec>,
    pub account_manager: Arc<AccountManager>,
    pub plan_manager: Arc<PlanManager>,
    pub ticket_manager: Arc<TicketManager>,
    pub note_manager: Arc<NoteManager>,
}

impl AppContext {
    /// Create a new application context that delivers notifications over SMTP
    pub async fn new(config: ServerConfig) -> HelpdeskResult<Self> {
        let mailer = Mailer::new(config.email.clone())?;
        if !mailer.is_configured() {
            tracing::warn!("SMTP not configured, ticket notifications will be skipped");
        }

        Self::with_notifier(config, Arc::new(mailer)).await
    }

    /// Create a context with an explicit notification transport
    pub async fn with_notifier(
        config: ServerConfig,
        notifier: Arc<dyn Notifier>,
    ) -> HelpdeskResult<Self> {
        // Validate configuration
        config.validate()?;

        let timeout = config.storage.query_timeout;
        let db = db::create_pool(
            &config.storage.database_path,
            db::DatabaseOptions {
                max_connections: config.storage.max_connections,
                timeout,
                ..Default::default()
            },
        )
        .await?;

        db::run_migrations(&db).await?;
        db::test_connection(&db).await?;

        let tokens = Arc::new(TokenCodec::from_config(&config.authentication)?);

        let account_manager = Arc::new(AccountManager::new(db.clone(), tokens.clone(), timeout));
        let plan_manager = Arc::new(PlanManager::new(db.clone(), timeout));
        let ticket_manager = Arc::new(TicketManager::new(
            db.clone(),
            NotificationDispatcher::new(notifier),
            timeout,
        ));
        let note_manager = Arc::new(NoteManager::new(db.clone(), timeout));

        if let Some(admin) = &config.authentication.bootstrap_admin {
            account_manager.ensure_bootstrap_admin(admin).await?;
        }

        Ok(Self {
            config: Arc::new(config),
            db,
            tokens,
            account_manager,
            plan_manager,
            ticket_manager,
            note_manager,
        })
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
