//! Outbound quote mail.
//!
//! [`DetachedNotifier`] is the [`Notifier`] the HTTP service hands to the
//! pricing pipeline. Each dispatch spawns a task on the current tokio runtime
//! and returns at once; the task's outcome is only ever logged.
//!
//! Transports:
//! - [`LogMailer`]: records messages in memory and logs them (no relay configured)
//! - [`SmtpMailer`]: submits each message to an SMTP server over STARTTLS
//! - [`RelayMailer`]: POSTs each message as JSON to an HTTP mail relay

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use delivery_core::{EmailMessage, Notifier};
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::config::{MailBackend, MailConfig};

/// Mail delivery failures
#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid mail settings: {0}")]
    InvalidConfig(String),

    #[error("message has no recipients")]
    NoRecipients,

    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("mail transport failed: {0}")]
    Transport(String),

    #[error("relay rejected message with status {status}: {detail}")]
    Rejected { status: u16, detail: String },
}

/// Something that can deliver an [`EmailMessage`]
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver one message
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;

    /// Transport name for logs
    fn name(&self) -> &'static str;
}

/// Record of a message accepted by [`LogMailer`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentEmail {
    /// Email ID
    pub email_id: String,
    /// From address
    pub from: String,
    /// To addresses
    pub to: Vec<String>,
    /// Subject
    pub subject: String,
    /// Body preview
    pub body_preview: String,
    /// Sent timestamp
    pub sent_at: String,
}

/// Transport that logs messages instead of delivering them
#[derive(Debug, Clone)]
pub struct LogMailer {
    from_address: String,
    sent_emails: Arc<RwLock<Vec<SentEmail>>>,
}

impl LogMailer {
    /// Create a log-only mailer sending as `from_address`
    pub fn new(from_address: &str) -> Self {
        Self {
            from_address: from_address.to_string(),
            sent_emails: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Messages accepted so far
    pub fn sent_emails(&self) -> Vec<SentEmail> {
        self.sent_emails
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of messages accepted so far
    pub fn email_count(&self) -> usize {
        self.sent_emails
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl MailTransport for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        if message.to.is_empty() {
            return Err(MailError::NoRecipients);
        }

        let email = SentEmail {
            email_id: format!("EMAIL-{}", uuid::Uuid::new_v4().simple()),
            from: self.from_address.clone(),
            to: message.to.clone(),
            subject: message.subject.clone(),
            body_preview: message.body.chars().take(100).collect(),
            sent_at: chrono::Utc::now().to_rfc3339(),
        };

        info!(
            email_id = %email.email_id,
            to = ?email.to,
            subject = %email.subject,
            "Email sent (log only)"
        );

        self.sent_emails
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(email);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// JSON body posted to the relay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayPayload {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Transport that posts messages to an HTTP mail relay
#[derive(Debug, Clone)]
pub struct RelayMailer {
    client: reqwest::Client,
    relay_url: String,
    api_token: Option<String>,
    from_address: String,
}

impl RelayMailer {
    /// Build a relay client from mail settings.
    ///
    /// Fails if no `relay_url` is configured.
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let relay_url = config
            .relay_url
            .clone()
            .ok_or_else(|| MailError::InvalidConfig("relay_url is not set".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MailError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            relay_url,
            api_token: config.api_token.clone(),
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl MailTransport for RelayMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        if message.to.is_empty() {
            return Err(MailError::NoRecipients);
        }

        let payload = RelayPayload {
            from: self.from_address.clone(),
            to: message.to.clone(),
            subject: message.subject.clone(),
            body: message.body.clone(),
        };

        let mut request = self.client.post(&self.relay_url).json(&payload);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        debug!(to = ?payload.to, status = status.as_u16(), "relay accepted message");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "relay"
    }
}

/// Transport that submits messages to an SMTP server over STARTTLS
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    host: String,
}

impl SmtpMailer {
    /// Build an SMTP client from mail settings.
    ///
    /// Fails if no `smtp_host` is configured or the sender is not a valid
    /// mailbox. No connection is made until the first send.
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let host = config
            .smtp_host
            .clone()
            .ok_or_else(|| MailError::InvalidConfig("smtp_host is not set".to_string()))?;

        let from: Mailbox = config.from_address.parse().map_err(|e| {
            MailError::InvalidConfig(format!(
                "from_address '{}': {}",
                config.from_address, e
            ))
        })?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host)
            .map_err(|e| MailError::InvalidConfig(e.to_string()))?
            .port(config.smtp_port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            host,
        })
    }

    fn build_message(&self, message: &EmailMessage) -> Result<Message, MailError> {
        if message.to.is_empty() {
            return Err(MailError::NoRecipients);
        }

        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN);
        for recipient in &message.to {
            let mailbox: Mailbox = recipient
                .parse()
                .map_err(|e| MailError::InvalidRecipient(format!("{}: {}", recipient, e)))?;
            builder = builder.to(mailbox);
        }

        builder
            .body(message.body.clone())
            .map_err(|e| MailError::InvalidRecipient(e.to_string()))
    }
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.host)
            .field("from", &self.from.to_string())
            .finish()
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let email = self.build_message(message)?;

        let response = self
            .transport
            .send(email)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        debug!(
            host = %self.host,
            to = ?message.to,
            code = %response.code(),
            "smtp server accepted message"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

/// Pick the transport the mail settings call for
pub fn build_transport(config: &MailConfig) -> Result<Arc<dyn MailTransport>, MailError> {
    match config.backend() {
        MailBackend::Smtp => Ok(Arc::new(SmtpMailer::new(config)?)),
        MailBackend::Relay => Ok(Arc::new(RelayMailer::new(config)?)),
        MailBackend::Log => Ok(Arc::new(LogMailer::new(&config.from_address))),
    }
}

/// [`Notifier`] that sends each message on a detached tokio task
#[derive(Clone)]
pub struct DetachedNotifier {
    transport: Arc<dyn MailTransport>,
}

impl DetachedNotifier {
    /// Wrap a transport
    pub fn new(transport: Arc<dyn MailTransport>) -> Self {
        Self { transport }
    }
}

impl std::fmt::Debug for DetachedNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetachedNotifier")
            .field("transport", &self.transport.name())
            .finish()
    }
}

impl Notifier for DetachedNotifier {
    fn dispatch(&self, message: EmailMessage) {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(to = ?message.to, "no async runtime available, quote email dropped");
                return;
            }
        };

        let transport = Arc::clone(&self.transport);
        handle.spawn(async move {
            match transport.send(&message).await {
                Ok(()) => debug!(
                    transport = transport.name(),
                    to = ?message.to,
                    "quote email delivered"
                ),
                Err(e) => warn!(
                    transport = transport.name(),
                    to = ?message.to,
                    error = %e,
                    "quote email failed"
                ),
            }
        });
    }
}
