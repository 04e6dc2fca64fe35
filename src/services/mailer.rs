//! Outbound mail
//!
//! `Mailer` is the seam between the application and an SMTP relay. Sending is
//! blocking; async callers go through [`deliver`], which runs it on the blocking pool.

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::info;

use crate::config::SmtpSettings;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP transport error: {0}")]
    Transport(String),

    #[error("Mail task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub trait Mailer: Send + Sync {
    fn send(&self, email: &OutgoingEmail) -> Result<(), MailerError>;
}

/// Send one email without blocking the async runtime
pub async fn deliver(mailer: Arc<dyn Mailer>, email: OutgoingEmail) -> Result<(), MailerError> {
    let recipient = email.to.clone();
    let subject = email.subject.clone();
    let result = tokio::task::spawn_blocking(move || mailer.send(&email))
        .await
        .map_err(|e| MailerError::Task(e.to_string()))?;

    crate::logging::log_mail_delivery(&recipient, &subject, result.is_ok());
    result
}

/// SMTP relay over STARTTLS
pub struct SmtpMailer {
    sender: Mailbox,
    transport: SmtpTransport,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings, host: &str) -> Result<Self, MailerError> {
        info!("Initializing SMTP mailer for {}:{}", host, settings.port);

        let sender = settings
            .sender
            .parse::<Mailbox>()
            .map_err(|_| MailerError::InvalidAddress(settings.sender.clone()))?;

        let mut builder = SmtpTransport::starttls_relay(host)
            .map_err(|e| MailerError::Transport(e.to_string()))?
            .port(settings.port);

        if let Some(username) = &settings.username {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                settings.password.clone().unwrap_or_default(),
            ));
        }

        Ok(Self {
            sender,
            transport: builder.build(),
        })
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, email: &OutgoingEmail) -> Result<(), MailerError> {
        let to = email
            .to
            .parse::<Mailbox>()
            .map_err(|_| MailerError::InvalidAddress(email.to.clone()))?;

        let message = Message::builder()
            .from(self.sender.clone())
            .to(to)
            .subject(email.subject.clone())
            .body(email.body.clone())
            .map_err(|e| MailerError::Build(e.to_string()))?;

        self.transport
            .send(&message)
            .map_err(|e| MailerError::Transport(e.to_string()))?;
        Ok(())
    }
}

/// Used when no SMTP host is configured: mail is written to the log and reported sent
#[derive(Debug, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, email: &OutgoingEmail) -> Result<(), MailerError> {
        info!(to = %email.to, subject = %email.subject, "Mail not sent (no SMTP configured)");
        Ok(())
    }
}

/// Build the mailer the configuration asks for
pub fn from_settings(settings: &SmtpSettings) -> Result<Arc<dyn Mailer>, MailerError> {
    match &settings.host {
        Some(host) => Ok(Arc::new(SmtpMailer::new(settings, host)?)),
        None => Ok(Arc::new(LogMailer)),
    }
}

/// Keeps every email in memory. Optionally fails from the n-th send onwards.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail_from: Option<usize>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `successes` emails, then fail every send after that
    pub fn failing_after(successes: usize) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_from: Some(successes),
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, email: &OutgoingEmail) -> Result<(), MailerError> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| MailerError::Transport("mailbox lock poisoned".to_string()))?;
        if self.fail_from.is_some_and(|limit| sent.len() >= limit) {
            return Err(MailerError::Transport("connection refused".to_string()));
        }
        sent.push(email.clone());
        Ok(())
    }
}
