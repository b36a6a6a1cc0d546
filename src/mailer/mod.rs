/// Email sending functionality
///
/// Outbound mail is best-effort. Senders implement [`Notifier`]; the
/// [`NotificationDispatcher`] runs each batch on a background task so delivery
/// latency and failures never reach the request that triggered them.
use crate::{
    config::EmailConfig,
    error::{HelpdeskError, HelpdeskResult},
};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Message},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A single outbound email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Outbound notification transport
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, email: &Email) -> HelpdeskResult<()>;
}

/// SMTP mailer
#[derive(Clone)]
pub struct Mailer {
    config: Option<EmailConfig>,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl Mailer {
    /// Create a new mailer; `None` disables sending
    pub fn new(config: Option<EmailConfig>) -> HelpdeskResult<Self> {
        let transport = if let Some(ref email_config) = config {
            let mut builder =
                AsyncSmtpTransport::<Tokio1Executor>::relay(&email_config.smtp_host)
                    .map_err(|e| HelpdeskError::Internal(format!("SMTP setup failed: {}", e)))?
                    .port(email_config.smtp_port)
                    .timeout(Some(email_config.send_timeout));

            if let (Some(username), Some(password)) =
                (&email_config.username, &email_config.password)
            {
                builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
            }

            Some(builder.build())
        } else {
            None
        };

        Ok(Self { config, transport })
    }

    /// Check if email is configured
    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }
}

#[async_trait]
impl Notifier for Mailer {
    async fn send(&self, email: &Email) -> HelpdeskResult<()> {
        let (config, transport) = match (&self.config, &self.transport) {
            (Some(config), Some(transport)) => (config, transport),
            _ => {
                tracing::warn!("Email not configured, skipping '{}' to {}", email.subject, email.to);
                return Ok(());
            }
        };

        let message = Message::builder()
            .from(config.from_address.parse().map_err(|e| {
                HelpdeskError::Internal(format!("Invalid from address: {}", e))
            })?)
            .to(email
                .to
                .parse()
                .map_err(|e| HelpdeskError::Internal(format!("Invalid to address: {}", e)))?)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| HelpdeskError::Internal(format!("Failed to build email: {}", e)))?;

        transport
            .send(message)
            .await
            .map_err(|e| HelpdeskError::Internal(format!("Failed to send email: {}", e)))?;

        tracing::info!("Sent email to {}: {}", email.to, email.subject);
        Ok(())
    }
}

/// Fire-and-forget delivery of notification batches
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Send every email in order on a background task
    ///
    /// Each email is attempted exactly once. Failures are logged and dropped.
    /// The returned handle may be ignored.
    pub fn dispatch(&self, emails: Vec<Email>) -> JoinHandle<()> {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            for email in emails {
                if let Err(e) = notifier.send(&email).await {
                    tracing::warn!("Notification '{}' to {} failed: {}", email.subject, email.to, e);
                }
            }
        })
    }
}
