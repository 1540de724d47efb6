//! SMTP delivery through an authenticated relay.

use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{debug, info};

use super::Notifier;
use crate::config::{NotifyConfig, TlsMode};
use crate::error::{Error, Result};

/// Sends notifications by mail.
///
/// Every [`send`](Notifier::send) opens its own connection (connect, TLS,
/// authenticate, send, quit); nothing is pooled between reports.
#[derive(Debug, Clone)]
pub struct SmtpNotifier {
    host: String,
    sender: Mailbox,
    config: NotifyConfig,
}

impl SmtpNotifier {
    /// Create a notifier from the `[notify]` configuration section.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the relay host or sender address is
    /// missing or the sender address cannot be parsed.
    pub fn new(config: NotifyConfig) -> Result<Self> {
        let host = config
            .smtp_host
            .clone()
            .filter(|host| !host.trim().is_empty())
            .ok_or_else(|| Error::ConfigValidation {
                message: "notify.smtp_host is required when mail is enabled".to_string(),
            })?;
        let sender = config
            .sender
            .as_deref()
            .ok_or_else(|| Error::ConfigValidation {
                message: "notify.sender is required when mail is enabled".to_string(),
            })?
            .parse::<Mailbox>()
            .map_err(|e| Error::ConfigValidation {
                message: format!("invalid notify.sender address: {e}"),
            })?;

        Ok(Self {
            host,
            sender,
            config,
        })
    }

    fn transport(&self) -> std::result::Result<SmtpTransport, lettre::transport::smtp::Error> {
        let builder = match self.config.tls {
            TlsMode::Implicit => SmtpTransport::relay(&self.host)?,
            TlsMode::StartTls => SmtpTransport::starttls_relay(&self.host)?,
        };
        let mut builder = builder
            .port(self.config.smtp_port)
            .timeout(Some(Duration::from_secs(self.config.timeout_secs)));
        if let (Some(username), Some(password)) = (&self.config.username, &self.config.password)
        {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }
        Ok(builder.build())
    }
}

impl Notifier for SmtpNotifier {
    fn name(&self) -> &'static str {
        "smtp"
    }

    fn send(&self, subject: &str, body: &str, recipient: &str) -> Result<()> {
        let to = recipient
            .parse::<Mailbox>()
            .map_err(|e| Error::notification(recipient, format!("invalid address: {e}")))?;

        let message = Message::builder()
            .from(self.sender.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| Error::notification(recipient, e))?;

        // The connection lives inside this transport and is dropped with it,
        // on success and on every error path below.
        let transport = self
            .transport()
            .map_err(|e| Error::notification(recipient, e))?;
        debug!(
            "Sending report mail via {}:{}",
            self.host, self.config.smtp_port
        );
        transport
            .send(&message)
            .map_err(|e| Error::notification(recipient, e))?;

        info!("Notification sent to {}", recipient);
        Ok(())
    }
}
