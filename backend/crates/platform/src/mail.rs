//! Outbound Mail
//!
//! [`EmailSender`] is implemented by an SMTP transport for production, a
//! logging sender for local development and an in-memory outbox for tests.
//! [`Mailer`] picks one at start-up so that callers stay non-generic.

use std::sync::{Arc, Mutex};

use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid mail address: {0}")]
    Address(String),

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP transport error: {0}")]
    Transport(String),
}

/// A plain-text email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    pub fn new(
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Sender port; callers see only the `Send` variant
pub mod port {
    use super::{EmailMessage, MailError};

    #[trait_variant::make(EmailSender: Send)]
    pub trait LocalEmailSender {
        async fn send(&self, message: EmailMessage) -> Result<(), MailError>;
    }
}

pub use port::EmailSender;

// ============================================================================
// SMTP
// ============================================================================

/// SMTP connection settings
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

/// STARTTLS relay backed by lettre's tokio transport
#[derive(Clone)]
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e: lettre::address::AddressError| MailError::Address(e.to_string()))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

impl EmailSender for SmtpEmailSender {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e: lettre::address::AddressError| MailError::Address(e.to_string()))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.body)
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(())
    }
}

// ============================================================================
// Development / test senders
// ============================================================================

/// Writes messages to the log instead of delivering them
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "Email not delivered (no SMTP host configured)"
        );
        Ok(())
    }
}

/// Collects messages in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryEmailSender {
    outbox: Arc<Mutex<Vec<EmailMessage>>>,
}

impl MemoryEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.outbox
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl EmailSender for MemoryEmailSender {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        self.outbox
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message);
        Ok(())
    }
}

// ============================================================================
// Runtime selection
// ============================================================================

#[derive(Clone)]
pub enum Mailer {
    Smtp(SmtpEmailSender),
    Log(LogEmailSender),
    Memory(MemoryEmailSender),
}

impl Mailer {
    /// SMTP when a host is configured, logging otherwise
    pub fn from_config(config: Option<&SmtpConfig>) -> Result<Self, MailError> {
        match config {
            Some(config) => Ok(Self::Smtp(SmtpEmailSender::new(config)?)),
            None => Ok(Self::Log(LogEmailSender)),
        }
    }
}

impl EmailSender for Mailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        match self {
            Mailer::Smtp(sender) => sender.send(message).await,
            Mailer::Log(sender) => sender.send(message).await,
            Mailer::Memory(sender) => sender.send(message).await,
        }
    }
}
