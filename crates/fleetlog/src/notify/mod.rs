//! Outbound notification when a report is submitted.
//!
//! The report engine only knows the [`Notifier`] trait. Two implementations
//! ship with the crate:
//!
//! - [`SmtpNotifier`]: authenticated mail relay over TLS.
//! - [`LogNotifier`]: writes the message to the log; used when mail is
//!   disabled in the configuration.

mod log_only;
mod smtp;

pub use log_only::LogNotifier;
pub use smtp::SmtpNotifier;

use crate::config::NotifyConfig;
use crate::error::Result;

/// Sends a finished report to a reviewer.
///
/// Implementors must release any connection they open before returning,
/// whether or not the send succeeded.
pub trait Notifier: std::fmt::Debug {
    /// The name of this notifier (for logging/debugging).
    fn name(&self) -> &'static str;

    /// Deliver one message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotificationFailure`](crate::Error::NotificationFailure)
    /// if the message could not be delivered.
    fn send(&self, subject: &str, body: &str, recipient: &str) -> Result<()>;
}

/// Build the notifier described by the configuration.
///
/// # Errors
///
/// Returns an error if the SMTP settings are unusable.
pub fn from_config(config: &NotifyConfig) -> Result<Box<dyn Notifier>> {
    if config.enabled {
        Ok(Box::new(SmtpNotifier::new(config.clone())?))
    } else {
        Ok(Box::new(LogNotifier))
    }
}
