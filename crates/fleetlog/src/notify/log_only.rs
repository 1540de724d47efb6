//! Notifier that writes submission notices to the log instead of sending mail.

use tracing::info;

use super::Notifier;
use crate::error::Result;

/// Notifier that only records the message in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    fn send(&self, subject: &str, body: &str, recipient: &str) -> Result<()> {
        info!(
            recipient,
            subject,
            body_len = body.len(),
            "Mail disabled; notification logged only"
        );
        Ok(())
    }
}
